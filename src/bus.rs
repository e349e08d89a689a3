/// Capability set the driver needs from the underlying I2C peripheral.
///
/// This mirrors a Wiring style two-wire interface. The bus is a shared
/// line that other drivers may also use, so every group of transactions
/// must be bracketed by [`lock`](I2cBus::lock)/[`unlock`](I2cBus::unlock).
pub trait I2cBus {
    /// Whether the peripheral has already been brought up
    fn is_enabled(&self) -> bool;

    /// Configure the bus clock in Hz, meaningful before [`enable`](I2cBus::enable)
    fn set_speed(&mut self, speed: u32);

    /// Bring the peripheral up
    fn enable(&mut self);

    /// Start buffering a write transaction for the given device address
    fn begin_transaction(&mut self, address: u8);

    /// Queue one byte into the current transaction
    fn write(&mut self, byte: u8);

    /// Send the buffered transaction, 0 means the device acked
    fn end_transaction(&mut self) -> u8;

    /// Request `count` bytes from the device, returns how many are available
    fn request(&mut self, address: u8, count: usize) -> usize;

    /// Pop the next received byte
    fn read(&mut self) -> u8;

    /// Try to take bus-wide mutual exclusion, false when unavailable
    fn lock(&mut self) -> bool;

    /// Release the bus-wide mutual exclusion
    fn unlock(&mut self);
}
