//! NMEA 2000 transport layer: CAN frame representation, 29-bit identifier
//! codec, Fast Packet segmentation/reassembly and bus abstraction traits.

pub mod can_frame;
pub mod can_id;
pub mod fast_packet;
pub mod traits;

/// Delay inserted between two frames of the same Fast Packet message (ms).
///
/// The protocol allows back-to-back frames, but small CAN controllers (three
/// frame TX buffers are common) drop frames without it.
pub const FAST_PACKET_INTER_FRAME_DELAY_MS: u32 = 2;

/// Upper bound a [`CanBus`](traits::can_bus::CanBus) implementation should
/// enforce on a single `send()` (ms).
///
/// At 250 kbit/s one frame takes about 0.5 ms; arbitration and retries keep
/// it under 20 ms on a healthy bus.
///
/// ```rust,ignore
/// use embassy_time::{with_timeout, Duration};
/// use n2k_calib::protocol::transport::CAN_SEND_TIMEOUT_MS;
///
/// with_timeout(
///     Duration::from_millis(CAN_SEND_TIMEOUT_MS as u64),
///     self.can.transmit_async(&frame),
/// )
/// .await
/// .map_err(|_| Error::Timeout)?
/// ```
pub const CAN_SEND_TIMEOUT_MS: u32 = 100;
