//! Core HTTP protocol types.
//!
//! Request methods are deliberately NOT modeled as an enum: the dispatcher
//! keys its method-scoped registry on verbatim method strings and compares
//! them by exact equality, so any token the client sends is carried as-is.

use crate::errors::ErrorKind;

// VERSION

/// HTTP protocol version.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// HTTP/1.0 - headers and status codes, no keep-alive by default
    ///
    /// [RFC 1945](https://tools.ietf.org/html/rfc1945)
    Http10,

    /// HTTP/1.1 - persistent connections
    ///
    /// [RFC 7230](https://tools.ietf.org/html/rfc7230) and related
    Http11,
}

impl Version {
    /// Parses the version token of a request line. HTTP/0.9 has no version
    /// token and HTTP/2+ never arrives over a plaintext request line, so
    /// anything but 1.0 and 1.1 is rejected.
    #[inline]
    pub(crate) fn from_token(token: &str) -> Result<Self, ErrorKind> {
        match token {
            "HTTP/1.1" => Ok(Self::Http11),
            "HTTP/1.0" => Ok(Self::Http10),
            _ => Err(ErrorKind::UnsupportedVersion),
        }
    }

    #[inline]
    pub(crate) const fn keep_alive_default(&self) -> bool {
        matches!(self, Self::Http11)
    }
}

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $name:ident = ($num:literal, $reason:literal);
    )+) => {
        /// HTTP response status codes.
        ///
        /// The set covers the codes a routing layer and its handlers
        /// produce in practice; see
        /// [RFC 9110, Section 15](https://datatracker.ietf.org/doc/html/rfc9110#section-15)
        /// for the full registry.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $(
            #[doc = concat!("`", stringify!($num), " ", $reason, "`")]
            $name = $num,
        )+ }

        impl StatusCode {
            /// Returns the numeric status code.
            #[inline]
            pub const fn as_u16(&self) -> u16 {
                *self as u16
            }

            /// Returns the canonical reason phrase.
            #[inline]
            pub const fn reason(&self) -> &'static str {
                match self { $(
                    StatusCode::$name => $reason,
                )+ }
            }

            // Pre-rendered first line, e.g. `HTTP/1.1 200 OK\r\n`.
            #[inline]
            pub(crate) const fn status_line(&self, version: Version) -> &'static str {
                match (version, self) { $(
                    (Version::Http11, StatusCode::$name) => {
                        concat!("HTTP/1.1 ", $num, " ", $reason, "\r\n")
                    },
                    (Version::Http10, StatusCode::$name) => {
                        concat!("HTTP/1.0 ", $num, " ", $reason, "\r\n")
                    },
                )+ }
            }
        }
    }
}

set_status_codes! {
    Ok = (200, "OK");
    Created = (201, "Created");
    Accepted = (202, "Accepted");
    NoContent = (204, "No Content");

    MovedPermanently = (301, "Moved Permanently");
    Found = (302, "Found");
    SeeOther = (303, "See Other");
    NotModified = (304, "Not Modified");
    TemporaryRedirect = (307, "Temporary Redirect");
    PermanentRedirect = (308, "Permanent Redirect");

    BadRequest = (400, "Bad Request");
    Unauthorized = (401, "Unauthorized");
    Forbidden = (403, "Forbidden");
    NotFound = (404, "Not Found");
    MethodNotAllowed = (405, "Method Not Allowed");
    RequestTimeout = (408, "Request Timeout");
    Conflict = (409, "Conflict");
    Gone = (410, "Gone");
    LengthRequired = (411, "Length Required");
    PayloadTooLarge = (413, "Payload Too Large");
    UriTooLong = (414, "URI Too Long");
    UnsupportedMediaType = (415, "Unsupported Media Type");
    ImaTeapot = (418, "I'm a teapot");
    UnprocessableEntity = (422, "Unprocessable Entity");
    TooManyRequests = (429, "Too Many Requests");
    RequestHeaderFieldsTooLarge = (431, "Request Header Fields Too Large");

    InternalServerError = (500, "Internal Server Error");
    NotImplemented = (501, "Not Implemented");
    BadGateway = (502, "Bad Gateway");
    ServiceUnavailable = (503, "Service Unavailable");
    GatewayTimeout = (504, "Gateway Timeout");
    HttpVersionNotSupported = (505, "HTTP Version Not Supported");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_tokens() {
        assert_eq!(Version::from_token("HTTP/1.1"), Ok(Version::Http11));
        assert_eq!(Version::from_token("HTTP/1.0"), Ok(Version::Http10));
        assert_eq!(
            Version::from_token("HTTP/2.0"),
            Err(ErrorKind::UnsupportedVersion)
        );
        assert_eq!(
            Version::from_token("http/1.1"),
            Err(ErrorKind::UnsupportedVersion)
        );
    }

    #[test]
    fn keep_alive_defaults() {
        assert!(Version::Http11.keep_alive_default());
        assert!(!Version::Http10.keep_alive_default());
    }

    #[test]
    fn status_code_parts() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
        assert_eq!(StatusCode::NotFound.reason(), "Not Found");
    }

    #[test]
    fn status_lines() {
        assert_eq!(
            StatusCode::Ok.status_line(Version::Http11),
            "HTTP/1.1 200 OK\r\n"
        );
        assert_eq!(
            StatusCode::NotFound.status_line(Version::Http10),
            "HTTP/1.0 404 Not Found\r\n"
        );
    }
}
