//! Targets for encoding.
//!
//! This is a private module. The relevant items are re-exported by the
//! parent.

use std::{error, fmt, io};
use std::convert::Infallible;


//------------ Target --------------------------------------------------------

/// A target for encoding.
///
/// This type provides a simplified version of `io::Write` that allows an
/// implementing type to define its own error type. The main purpose is to
/// be able to set the error to `Infallible`. This allows users to erase
/// the error case and avoid unnecessary `unwrap`s.
///
/// Encoders may call `write_all` any number of times with pieces of any
/// size, including empty ones. Returning an error aborts the encoding.
pub trait Target {
    /// The error type of the target.
    type Error: error::Error;

    /// Writes the data to the target.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

impl<T: Target + ?Sized> Target for &mut T {
    type Error = T::Error;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write_all(data)
    }
}

impl Target for Vec<u8> {
    type Error = Infallible;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.extend_from_slice(data);
        Ok(())
    }
}


//------------ IoTarget ------------------------------------------------------

/// A wrapper around a `io::Write` type providing it as a target.
pub struct IoTarget<W>(W);

impl<W> IoTarget<W> {
    /// Creates a new target from an IO writer.
    pub fn new(writer: W) -> Self {
        Self(writer)
    }

    /// Converts the target back into its underlying writer.
    pub fn into_writer(self) -> W {
        self.0
    }
}

impl<W> From<W> for IoTarget<W> {
    fn from(src: W) -> Self {
        Self::new(src)
    }
}

impl<W: io::Write> Target for IoTarget<W> {
    type Error = io::Error;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0.write_all(data)
    }
}


//------------ FnTarget ------------------------------------------------------

/// A target handing all data to a closure.
///
/// The closure returns whether it accepted the data. If it returns `false`,
/// the encoder stops with a [`Refused`] error.
pub struct FnTarget<F>(F);

impl<F: FnMut(&[u8]) -> bool> FnTarget<F> {
    /// Creates a new target from a closure.
    pub fn new(op: F) -> Self {
        FnTarget(op)
    }
}

impl<F: FnMut(&[u8]) -> bool> Target for FnTarget<F> {
    type Error = Refused;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if (self.0)(data) {
            Ok(())
        }
        else {
            Err(Refused)
        }
    }
}


//------------ Refused -------------------------------------------------------

/// A closure target refused to take more data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Refused;

impl fmt::Display for Refused {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("target refused data")
    }
}

impl error::Error for Refused { }


//------------ CountTarget ---------------------------------------------------

/// A target that only counts the octets written to it.
#[derive(Clone, Copy, Debug, Default)]
pub struct CountTarget(usize);

impl CountTarget {
    /// Creates a new counting target.
    pub fn new() -> Self {
        CountTarget(0)
    }

    /// Returns the number of octets written so far.
    pub fn count(self) -> usize {
        self.0
    }
}

impl Target for CountTarget {
    type Error = Infallible;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0 += data.len();
        Ok(())
    }
}


//------------ Counted -------------------------------------------------------

/// A wrapper around a target that counts what passes through it.
pub struct Counted<T> {
    target: T,
    count: usize,
}

impl<T> Counted<T> {
    /// Creates a new counting wrapper.
    pub fn new(target: T) -> Self {
        Counted { target, count: 0 }
    }

    /// Returns the number of octets written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the wrapped target.
    pub fn into_target(self) -> T {
        self.target
    }
}

impl<T: Target> Target for Counted<T> {
    type Error = T::Error;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.target.write_all(data)?;
        self.count += data.len();
        Ok(())
    }
}


//------------ infallible ----------------------------------------------------

/// Erases an error if it can’t happen.
pub fn infallible<T, E: Into<Infallible>>(res: Result<T, E>) -> T {
    match res {
        Ok(some) => some,
        Err(err) => match err.into() { }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fn_target_in_pieces() {
        let mut collected = Vec::new();
        let mut calls = 0;
        {
            let mut target = FnTarget::new(|data: &[u8]| {
                calls += 1;
                collected.extend_from_slice(data);
                true
            });
            target.write_all(b"ab").unwrap();
            target.write_all(b"").unwrap();
            target.write_all(b"cde").unwrap();
        }
        assert_eq!(calls, 3);
        assert_eq!(collected, b"abcde");
    }

    #[test]
    fn fn_target_refuses() {
        let mut target = FnTarget::new(|data: &[u8]| data.len() < 3);
        assert!(target.write_all(b"ab").is_ok());
        assert_eq!(target.write_all(b"abc"), Err(Refused));
    }

    #[test]
    fn counting() {
        let mut count = CountTarget::new();
        infallible(count.write_all(b"1234"));
        infallible(count.write_all(b"56"));
        assert_eq!(count.count(), 6);

        let mut counted = Counted::new(Vec::new());
        infallible(counted.write_all(b"xyz"));
        assert_eq!(counted.count(), 3);
    }
}
