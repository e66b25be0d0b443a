/// Test doubles to simulate the CAN bus, the timer and the calibrated device.
use n2k_calib::protocol::calibration::{CalibrationListener, ItemKind};
use n2k_calib::protocol::messages::schema::{BuiltinSchema, SchemaProvider};
use n2k_calib::protocol::messages::PgnMessage;
use n2k_calib::protocol::transport::{
    can_frame::CanFrame,
    fast_packet::assembler::{FastPacketAssembler, ProcessResult},
    traits::{can_bus::CanBus, n2k_timer::N2kTimer},
};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Duration};

#[derive(Clone)]
#[allow(dead_code)]
/// In-memory CAN bus reproducing the `CanBus` trait behavior.
pub struct MockCanBus {
    tx: mpsc::UnboundedSender<CanFrame>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<CanFrame>>>,
}

#[allow(dead_code)]
impl MockCanBus {
    /// Construct a pair of interconnected buses (DUT ↔ device).
    pub fn create_pair() -> (Self, Self) {
        let (dut_tx, host_rx) = mpsc::unbounded_channel();
        let (host_tx, dut_rx) = mpsc::unbounded_channel();

        let dut_bus = Self {
            tx: dut_tx,
            rx: Arc::new(Mutex::new(dut_rx)),
        };

        let host_bus = Self {
            tx: host_tx,
            rx: Arc::new(Mutex::new(host_rx)),
        };

        (dut_bus, host_bus)
    }
}

impl CanBus for MockCanBus {
    type Error = ();

    async fn send<'a>(&'a mut self, frame: &'a CanFrame) -> Result<(), Self::Error> {
        self.tx.send(*frame).map_err(|_| ())?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<CanFrame, Self::Error> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(())
    }
}

#[allow(dead_code)]
/// Timer based on `tokio::time::sleep` to drive delays in tests.
pub struct MockTimer;

impl N2kTimer for MockTimer {
    async fn delay_ms(&mut self, millis: u32) {
        sleep(Duration::from_millis(millis as u64)).await;
    }
}

#[derive(Debug, Default)]
#[allow(dead_code)]
/// Listener keeping every callback for later assertions.
pub struct Recorder {
    pub connections: Vec<bool>,
    pub values: Vec<(ItemKind, f64)>,
    pub calibrations: Vec<(ItemKind, f64)>,
}

impl CalibrationListener for Recorder {
    fn on_connection_status(&mut self, connected: bool) {
        self.connections.push(connected);
    }

    fn on_value_received(&mut self, kind: ItemKind, value: f64) {
        self.values.push((kind, value));
    }

    fn on_calibration_received(&mut self, kind: ItemKind, value: f64) {
        self.calibrations.push((kind, value));
    }
}

#[allow(dead_code)]
/// Read frames from `bus` until a whole message is reassembled.
pub async fn next_message(bus: &mut MockCanBus, assembler: &mut FastPacketAssembler) -> PgnMessage {
    loop {
        let frame = bus.recv().await.expect("bus closed");
        let fast_packet = BuiltinSchema.is_fast_packet(frame.id.pgn());
        if let ProcessResult::MessageComplete(completed) =
            assembler.process_frame(&frame, fast_packet)
        {
            return PgnMessage::from_completed(&completed, &BuiltinSchema);
        }
    }
}

#[allow(dead_code)]
/// Tolerant float comparison.
pub fn close(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}
