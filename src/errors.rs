use crate::Version;
use std::{error, fmt, io};

/// Error reported by the dispatcher's registration operations.
///
/// Registration is infallible under correct use; the only reachable case is
/// the defensive guard below. It is returned rather than panicking so the
/// embedding application decides whether to abort startup or ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// [`register_path_method`](crate::Dispatcher::register_path_method)
    /// was called with an empty method list, leaving nothing to bind.
    NoMethods,
}

impl error::Error for RegistrationError {}
impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMethods => {
                write!(f, "a method-scoped registration requires at least one method name")
            }
        }
    }
}

// TRANSPORT ERRORS

#[derive(Debug, PartialEq)]
pub(crate) enum ErrorKind {
    InvalidRequestLine,
    UnsupportedVersion,
    InvalidEncoding,

    InvalidHeader,
    TooManyHeaders,
    InvalidContentLength,

    HeadTooLarge,
    BodyTooLarge,

    ServiceUnavailable,
    Io(IoError),
}

macro_rules! http_errors {
    ($($name:ident: $status_line:expr, $len:literal => $body:literal; )*) => {
        // Canned response for a request that never reaches a handler.
        pub(crate) const fn as_http(&self, version: Version) -> &'static [u8] {
            match (self, version) { $(
                (Self::$name { .. }, Version::Http11) => concat!(
                    "HTTP/1.1 ", $status_line, "\r\n",
                    "connection: close\r\n",
                    "content-type: text/plain\r\n",
                    "content-length: ", $len, "\r\n",
                    "\r\n",
                    $body
                ),
                (Self::$name { .. }, Version::Http10) => concat!(
                    "HTTP/1.0 ", $status_line, "\r\n",
                    "connection: close\r\n",
                    "content-type: text/plain\r\n",
                    "content-length: ", $len, "\r\n",
                    "\r\n",
                    $body
                ),
            )* }.as_bytes()
        }
    };
}

impl ErrorKind {
    http_errors! {
        InvalidRequestLine: "400 Bad Request", "22"
            => "malformed request line";
        UnsupportedVersion: "505 HTTP Version Not Supported", "28"
            => "unsupported protocol version";
        InvalidEncoding: "400 Bad Request", "31"
            => "request head is not valid UTF-8";

        InvalidHeader: "400 Bad Request", "21"
            => "malformed header line";
        TooManyHeaders: "431 Request Header Fields Too Large", "16"
            => "too many headers";
        InvalidContentLength: "400 Bad Request", "22"
            => "invalid content-length";

        HeadTooLarge: "431 Request Header Fields Too Large", "22"
            => "request head too large";
        BodyTooLarge: "413 Payload Too Large", "22"
            => "request body too large";

        ServiceUnavailable: "503 Service Unavailable", "31"
            => "service temporarily unavailable";
        Io: "503 Service Unavailable", "9"
            => "i/o error";
    }
}

impl error::Error for ErrorKind {}
impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

#[derive(Debug)]
pub(crate) struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}
