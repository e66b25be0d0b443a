//! Asynchronous timer abstraction used to pace Fast Packet transmissions.

/// Timer trait abstraction; must remain thread-safe when applicable.
pub trait N2kTimer {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(&'a mut self, millis: u32) -> impl core::future::Future<Output = ()> + 'a;
}
