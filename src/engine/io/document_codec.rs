//! Converts documents to and from the text stored on disk.
//!
//! Documents are pretty printed JSON, indented with tabs and always followed by a newline.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;
use thiserror::Error;

use crate::constants::JSON_INDENT;

pub struct DocumentCodec {}

impl DocumentCodec {
    /// Transforms the document to the text that will land on disk
    pub fn encode<T>(document: &T) -> Result<Bytes, DocumentCodecError>
    where
        T: Serialize + ?Sized,
    {
        let formatter = PrettyFormatter::with_indent(JSON_INDENT);
        let mut writer = BytesMut::new().writer();
        let mut serializer = Serializer::with_formatter(&mut writer, formatter);
        document
            .serialize(&mut serializer)
            .map_err(DocumentCodecError::Encode)?;

        let mut buffer = writer.into_inner();
        buffer.put_u8(b'\n');
        Ok(buffer.freeze())
    }

    pub fn decode<T>(input: &[u8]) -> Result<T, DocumentCodecError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(input).map_err(DocumentCodecError::Decode)
    }
}

#[derive(Debug, Error)]
pub enum DocumentCodecError {
    #[error("Unable to encode document: {0}")]
    Encode(serde_json::Error),
    #[error("Unable to decode document: {0}")]
    Decode(serde_json::Error),
}
