//! The BER mode.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.


//------------ Mode ----------------------------------------------------------

/// The decoding mode for the TLV based rules.
///
/// The encoder always produces DER. The decoder can be told to be lenient
/// and accept anything BER permits, or to insist on the distinguished
/// encoding.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Mode {
    /// Basic Encoding Rules.
    ///
    /// These are the most flexible rules, allowing alternative encodings
    /// for some types as well as indefinite length values.
    Ber,

    /// Distinguished Encoding Rules.
    ///
    /// These rules always employ definite length values and require the
    /// shortest possible encoding. Additional rules apply to some types.
    Der,
}

impl Mode {
    /// Returns whether the mode is the restricted DER mode.
    pub fn is_restricted(self) -> bool {
        matches!(self, Mode::Der)
    }

    /// Returns whether the mode allows indefinite length values.
    pub fn allows_indefinite(self) -> bool {
        matches!(self, Mode::Ber)
    }

    /// Returns whether strings may be encoded in constructed form.
    pub fn allows_constructed_strings(self) -> bool {
        matches!(self, Mode::Ber)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Ber
    }
}
