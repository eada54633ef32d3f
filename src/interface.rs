//! The interface to the bus that connects the display.

/// An interface for transmitting to the display controller. A call to either method is one bus
/// transaction: the transport opens the transaction, transfers every byte, and closes it before
/// returning, with nothing interleaved. Transmission is fire-and-forget; the chip offers no
/// readback, so a reported success only means the transaction was issued, not that the panel
/// acted on it.
pub trait DisplayInterface {
    /// Transmit a sequence of encoded instruction bytes in one transaction.
    fn send_commands(&mut self, cmds: &[u8]) -> Result<(), ()>;
    /// Transmit a run of display RAM data bytes in one transaction. The chip's address cursor
    /// auto-increments across the run and across subsequent calls.
    fn send_data(&mut self, buf: &[u8]) -> Result<(), ()>;
}

pub mod i2c {
    //! The I2C interface of the chip. The C115 module only routes the I2C pins, so this is the
    //! interface a driver for it will use in practice. Each transaction opens with a control
    //! byte that tells the chip whether the remaining bytes are instructions or RAM data, which
    //! caps the usable payload at 31 bytes out of the 32-byte transaction.

    use embedded_hal::blocking::i2c;

    use super::DisplayInterface;

    /// The fixed I2C slave address of the ST7558.
    pub const DEFAULT_ADDRESS: u8 = 0x3C;

    const CONTROL_CMD: u8 = 0x00;
    const CONTROL_DATA: u8 = 0x40;
    const MAX_TRANSACTION_LEN: usize = 32;

    pub struct I2cInterface<I2C> {
        /// The I2C master device connected to the ST7558.
        i2c: I2C,
        /// The slave address of the display, `DEFAULT_ADDRESS` unless the module is strapped
        /// otherwise.
        address: u8,
    }

    impl<I2C> I2cInterface<I2C>
    where
        I2C: i2c::Write,
    {
        /// Create a new I2C interface to communicate with the display driver. `i2c` is the I2C
        /// master device, and `address` is the display's slave address.
        pub fn new(i2c: I2C, address: u8) -> Self {
            Self { i2c, address }
        }

        /// Release the underlying bus peripheral.
        pub fn release(self) -> I2C {
            self.i2c
        }

        fn write_prefixed(&mut self, control: u8, payload: &[u8]) -> Result<(), ()> {
            if payload.len() > MAX_TRANSACTION_LEN - 1 {
                return Err(());
            }
            let mut buf = [0u8; MAX_TRANSACTION_LEN];
            buf[0] = control;
            buf[1..=payload.len()].copy_from_slice(payload);
            self.i2c
                .write(self.address, &buf[..payload.len() + 1])
                .map_err(|_| ())
        }
    }

    impl<I2C> DisplayInterface for I2cInterface<I2C>
    where
        I2C: i2c::Write,
    {
        fn send_commands(&mut self, cmds: &[u8]) -> Result<(), ()> {
            self.write_prefixed(CONTROL_CMD, cmds)
        }

        fn send_data(&mut self, buf: &[u8]) -> Result<(), ()> {
            self.write_prefixed(CONTROL_DATA, buf)
        }
    }

}

#[cfg(test)]
pub mod test_spy {
    //! An interface for use in unit tests to spy on whatever was sent to it.

    use std::cell::RefCell;
    use std::rc::Rc;

    use super::DisplayInterface;

    /// One recorded transaction, as seen at the `DisplayInterface` seam (control/marker bytes
    /// belong to the transport below and do not appear here).
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Sent {
        Cmds(Vec<u8>),
        Data(Vec<u8>),
    }

    pub struct TestSpyInterface {
        sent: Rc<RefCell<Vec<Sent>>>,
    }

    impl TestSpyInterface {
        pub fn new() -> Self {
            TestSpyInterface {
                sent: Rc::new(RefCell::new(Vec::new())),
            }
        }

        /// Obtain a second handle to the same spy, so one can be moved into the display under
        /// test while the test keeps the other for checking.
        pub fn split(&self) -> Self {
            TestSpyInterface {
                sent: self.sent.clone(),
            }
        }

        pub fn clear(&mut self) {
            self.sent.borrow_mut().clear();
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.sent.borrow().clone()
        }

        pub fn check_multi(&self, expect: &[Sent]) {
            assert_eq!(*self.sent.borrow(), expect);
        }
    }

    impl DisplayInterface for TestSpyInterface {
        fn send_commands(&mut self, cmds: &[u8]) -> Result<(), ()> {
            self.sent.borrow_mut().push(Sent::Cmds(cmds.to_vec()));
            Ok(())
        }

        fn send_data(&mut self, buf: &[u8]) -> Result<(), ()> {
            self.sent.borrow_mut().push(Sent::Data(buf.to_vec()));
            Ok(())
        }
    }
}
