//! Minimal abstraction for an asynchronous CAN bus. Lets the library plug
//! into an embedded HAL driver, a USB adapter or a test double alike.
use crate::protocol::transport::can_frame::CanFrame;
use futures_util::Future;

/// Contract to send and receive CAN frames asynchronously.
pub trait CanBus {
    type Error: core::fmt::Debug;
    /// Emit a frame on the bus.
    fn send<'a>(
        &'a mut self,
        frame: &'a CanFrame,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'a;
    /// Wait for the next frame. An error means the link is gone.
    fn recv<'a>(&'a mut self) -> impl Future<Output = Result<CanFrame, Self::Error>> + 'a;
}
