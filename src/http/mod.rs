pub mod codec;
pub mod digest;
pub mod headers;
pub mod requestbody;
pub mod response;

// Re-exports for convenience
pub use codec::{Codecs, JsonCodec, SerdeJsonCodec, XmlCodec, XmlDocument, XmlElement, XmlNode};
#[cfg(feature = "xml")]
pub use codec::RoxmlCodec;
pub use digest::{ResponseKind, ResponseType};
pub use headers::Headers;
pub use requestbody::{FormFields, RequestData, Scalar};
pub use response::{ParsedResponse, ResponseEnvelope};
