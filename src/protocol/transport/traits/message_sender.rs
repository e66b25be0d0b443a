//! `CanBus` extension sending a whole [`PgnMessage`]: it cuts the payload into
//! frames (Fast Packet when needed) and transmits them in sequence.
//!
//! Consecutive frames of a Fast Packet message are separated by
//! [`FAST_PACKET_INTER_FRAME_DELAY_MS`] so small controllers keep up.
use crate::{
    error::SendMessageError,
    protocol::messages::PgnMessage,
    protocol::transport::traits::{can_bus::CanBus, n2k_timer::N2kTimer},
    protocol::transport::FAST_PACKET_INTER_FRAME_DELAY_MS,
};

/// Trait extending `CanBus` with message-level sending.
pub trait MessageSender: CanBus {
    /// Segment and send `message`.
    ///
    /// # Errors
    ///
    /// - [`SendMessageError::Framing`] when the frames cannot be built
    ///   (nothing is sent in that case)
    /// - [`SendMessageError::Send`] when the bus refuses a frame
    ///
    /// ```rust,ignore
    /// let request = builder.build_request(130900)?;
    /// can_bus.send_message(&request, &mut timer).await?;
    /// ```
    fn send_message<'a, T: N2kTimer>(
        &'a mut self,
        message: &'a PgnMessage,
        timer: &'a mut T,
    ) -> impl core::future::Future<Output = Result<(), SendMessageError<Self::Error>>> + 'a;
}

impl<C: CanBus> MessageSender for C {
    fn send_message<'a, T: N2kTimer>(
        &'a mut self,
        message: &'a PgnMessage,
        timer: &'a mut T,
    ) -> impl core::future::Future<Output = Result<(), SendMessageError<Self::Error>>> + 'a {
        async move {
            let frames = message.frames().map_err(SendMessageError::Framing)?;
            let paced = frames.is_fast_packet();

            for (index, frame) in frames.enumerate() {
                if paced && index > 0 {
                    timer.delay_ms(FAST_PACKET_INTER_FRAME_DELAY_MS).await;
                }
                self.send(&frame).await.map_err(SendMessageError::Send)?;
            }

            #[cfg(feature = "defmt")]
            defmt::trace!(
                "Sent PGN {} to {} ({} bytes)",
                message.pgn(),
                message.destination(),
                message.payload().len()
            );
            Ok(())
        }
    }
}
