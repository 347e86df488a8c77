// XML codec shared by both clients.
//
// Element names are matched by local name when decoding, so the
// `ovf:`/`rasd:`/`vcloud:` prefixes in server documents don't matter.
// Encoding writes whatever names the serde renames spell out, which is how
// the namespaced request bodies get their prefixes.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Decode an XML document into `T`.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    quick_xml::de::from_str(body).map_err(|e| {
        let preview = body.chars().take(200).collect::<String>();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

/// Encode `value` as an XML document whose root element is `root`.
pub fn encode<T: Serialize>(root: &str, value: &T) -> Result<String, Error> {
    quick_xml::se::to_string_with_root(root, value).map_err(|e| Error::Serialization(e.to_string()))
}
