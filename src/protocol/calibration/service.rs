//! Calibration service built on top of [`CalibrationSession`].
//!
//! The session is shared between two components:
//!
//! * a runner (`CalibrationRunner`) owning the bus, the timer and the Fast
//!   Packet assembler; it feeds received messages to the session and sends
//!   the queued requests and commands;
//! * a handle (`CalibrationHandle`) used by the application to tick the
//!   session and trigger user actions.
//!
//! Firmware provides the pre-allocated [`SharedSession`] and command
//! [`Channel`]. No allocation is performed by the library. Listener callbacks
//! run while the session lock is held and must stay short.
use core::cell::RefCell;

use embassy_sync::{
    blocking_mutex::{raw::CriticalSectionRawMutex, Mutex},
    channel::{Channel, Receiver, Sender},
};
use futures_util::{future::select, future::Either, pin_mut};

use super::session::{CalibrationSession, ITEM_COUNT};
use super::{CalibrationListener, ItemKind};
use crate::error::{CalibrationRunError, SendMessageError, SessionError};
use crate::protocol::messages::schema::SchemaProvider;
use crate::protocol::messages::PgnMessage;
use crate::protocol::transport::fast_packet::assembler::{FastPacketAssembler, ProcessResult};
use crate::protocol::transport::traits::{
    can_bus::CanBus, message_sender::MessageSender, n2k_timer::N2kTimer,
};

/// Session guarded for use from the runner and the handle.
pub type SharedSession<S, L> =
    Mutex<CriticalSectionRawMutex, RefCell<CalibrationSession<S, L>>>;

/// Messages queued by the handle for the runner.
#[derive(Debug, Clone, Copy)]
pub enum OutboundCommand {
    Send(PgnMessage),
}

/// Service assembling the calibration components.
pub struct CalibrationService<'a, C, T, S, L, const CMD_CAP: usize>
where
    C: CanBus,
    T: N2kTimer,
    S: SchemaProvider,
    L: CalibrationListener,
{
    bus: C,
    timer: T,
    session: &'a SharedSession<S, L>,
    command_channel: &'a Channel<CriticalSectionRawMutex, OutboundCommand, CMD_CAP>,
}

impl<'a, C, T, S, L, const CMD_CAP: usize> CalibrationService<'a, C, T, S, L, CMD_CAP>
where
    C: CanBus,
    T: N2kTimer,
    S: SchemaProvider,
    L: CalibrationListener,
{
    pub fn new(
        bus: C,
        timer: T,
        session: &'a SharedSession<S, L>,
        command_channel: &'a Channel<CriticalSectionRawMutex, OutboundCommand, CMD_CAP>,
    ) -> Self {
        Self {
            bus,
            timer,
            session,
            command_channel,
        }
    }

    /// Split into handle/runner components.
    pub fn into_parts(self) -> CalibrationServiceParts<'a, C, T, S, L, CMD_CAP> {
        CalibrationServiceParts {
            handle: CalibrationHandle {
                session: self.session,
                sender: self.command_channel.sender(),
            },
            runner: CalibrationRunner {
                bus: self.bus,
                timer: self.timer,
                session: self.session,
                commands: self.command_channel.receiver(),
                assembler: FastPacketAssembler::new(),
            },
        }
    }
}

/// Bundle returned by [`CalibrationService::into_parts`].
pub struct CalibrationServiceParts<'a, C, T, S, L, const CMD_CAP: usize>
where
    C: CanBus,
    T: N2kTimer,
    S: SchemaProvider,
    L: CalibrationListener,
{
    pub handle: CalibrationHandle<'a, S, L, CMD_CAP>,
    pub runner: CalibrationRunner<'a, C, T, S, L, CMD_CAP>,
}

//==================================================================================RUNNER
/// Runner that drives the bus side of the session.
pub struct CalibrationRunner<'a, C, T, S, L, const CMD_CAP: usize>
where
    C: CanBus,
    T: N2kTimer,
    S: SchemaProvider,
    L: CalibrationListener,
{
    bus: C,
    timer: T,
    session: &'a SharedSession<S, L>,
    commands: Receiver<'a, CriticalSectionRawMutex, OutboundCommand, CMD_CAP>,
    assembler: FastPacketAssembler,
}

impl<'a, C, T, S, L, const CMD_CAP: usize> CalibrationRunner<'a, C, T, S, L, CMD_CAP>
where
    C: CanBus,
    T: N2kTimer,
    S: SchemaProvider,
    L: CalibrationListener,
{
    /// Run until the bus fails. Messages whose frames cannot be built are
    /// dropped; any bus error ends the loop.
    pub async fn drive(mut self) -> Result<(), CalibrationRunError<C::Error>> {
        loop {
            let mut frame_received = None;
            let mut command_to_send = None;

            {
                let recv_future = self.bus.recv();
                let cmd_future = self.commands.receive();
                pin_mut!(recv_future);
                pin_mut!(cmd_future);

                match select(recv_future, cmd_future).await {
                    Either::Left((result, pending_cmd)) => {
                        frame_received = Some(result);
                        drop(pending_cmd);
                    }
                    Either::Right((command, pending_recv)) => {
                        command_to_send = Some(command);
                        drop(pending_recv);
                    }
                }
            }

            match frame_received {
                Some(Ok(frame)) => {
                    let session = self.session;
                    let assembler = &mut self.assembler;
                    session.lock(|cell| {
                        let mut session = cell.borrow_mut();
                        let fast_packet = session.schema().is_fast_packet(frame.id.pgn());
                        if let ProcessResult::MessageComplete(completed) =
                            assembler.process_frame(&frame, fast_packet)
                        {
                            let message = PgnMessage::from_completed(&completed, session.schema());
                            session.on_message(&message);
                        }
                    });
                }
                Some(Err(err)) => return Err(CalibrationRunError::Receive(err)),
                None => {}
            }

            if let Some(OutboundCommand::Send(message)) = command_to_send {
                match self.bus.send_message(&message, &mut self.timer).await {
                    Ok(()) => {}
                    Err(SendMessageError::Framing(_err)) => {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("PGN {} not sent: {}", message.pgn(), _err);
                    }
                    Err(err) => return Err(CalibrationRunError::Send(err)),
                }
            }
        }
    }
}

//==================================================================================HANDLE
/// Application side of the service.
pub struct CalibrationHandle<'a, S, L, const CMD_CAP: usize>
where
    S: SchemaProvider,
    L: CalibrationListener,
{
    session: &'a SharedSession<S, L>,
    sender: Sender<'a, CriticalSectionRawMutex, OutboundCommand, CMD_CAP>,
}

impl<'a, S, L, const CMD_CAP: usize> CalibrationHandle<'a, S, L, CMD_CAP>
where
    S: SchemaProvider,
    L: CalibrationListener,
{
    /// Tick the session and queue the requests it produced.
    pub async fn tick(&self) -> usize {
        let mut requests: [Option<PgnMessage>; ITEM_COUNT] = [None; ITEM_COUNT];
        let emitted = self.session.lock(|cell| {
            let mut slots = requests.iter_mut();
            cell.borrow_mut().on_tick(|request| {
                if let Some(slot) = slots.next() {
                    *slot = Some(request);
                }
            })
        });
        for request in requests.into_iter().flatten() {
            self.sender.send(OutboundCommand::Send(request)).await;
        }
        emitted
    }

    /// Report a link change to the session.
    pub fn connection_changed(&self, connected: bool) {
        self.session
            .lock(|cell| cell.borrow_mut().on_connection_status(connected));
    }

    /// Store the value the user wants for `kind`.
    pub fn set_pending(&self, kind: ItemKind, value: f64) -> Result<(), SessionError> {
        self.session
            .lock(|cell| cell.borrow_mut().set_pending(kind, value))
    }

    /// Queue the command writing the pending value of `kind`.
    pub async fn submit(&self, kind: ItemKind) -> Result<(), SessionError> {
        let command = self.session.lock(|cell| cell.borrow_mut().submit(kind))?;
        self.sender.send(OutboundCommand::Send(command)).await;
        Ok(())
    }

    /// Queue the command restoring the device default of `kind`.
    pub async fn reset(&self, kind: ItemKind) -> Result<(), SessionError> {
        let command = self.session.lock(|cell| cell.borrow_mut().reset(kind))?;
        self.sender.send(OutboundCommand::Send(command)).await;
        Ok(())
    }

    /// Read the session state.
    pub fn with_session<R>(&self, f: impl FnOnce(&CalibrationSession<S, L>) -> R) -> R {
        self.session.lock(|cell| f(&cell.borrow()))
    }
}
