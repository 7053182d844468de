/// The external tools the delegated strategies rely on.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// `qpdf --is-encrypted` for PDF files.
    Qpdf,
    /// `zipinfo -v` (from Info-ZIP unzip) for ZIP archives.
    Zipinfo,
    /// `msoffcrypto-tool -t -v` for Office documents.
    MsOffCrypto,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Qpdf, Tool::Zipinfo, Tool::MsOffCrypto];

    /// Executable name looked up on the tool host.
    pub fn program(self) -> &'static str {
        match self {
            Self::Qpdf => "qpdf",
            Self::Zipinfo => "zipinfo",
            Self::MsOffCrypto => "msoffcrypto-tool",
        }
    }

    /// How a user gets the tool onto their system.
    pub fn install_hint(self) -> &'static str {
        match self {
            Self::Qpdf => "install qpdf",
            Self::Zipinfo => "install unzip",
            Self::MsOffCrypto => "pip install msoffcrypto-tool",
        }
    }

    /// pip installs into the user's home, which only a login shell puts on `PATH`.
    pub(crate) fn needs_login_shell(self) -> bool {
        matches!(self, Self::MsOffCrypto)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}
