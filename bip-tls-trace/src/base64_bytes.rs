//! Serde helper that renders raw byte fields as base64 strings

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serializer;

#[allow(clippy::ptr_arg)]
pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if bytes.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    #[derive(Serialize)]
    struct Holder {
        #[serde(with = "crate::base64_bytes")]
        data: Vec<u8>,
    }

    #[test]
    fn test_base64_serialization() {
        let json = serde_json::to_string(&Holder { data: vec![0xDE, 0xAD, 0xBE, 0xEF] }).unwrap();
        assert_eq!(json, r#"{"data":"3q2+7w=="}"#);

        let empty = serde_json::to_string(&Holder { data: Vec::new() }).unwrap();
        assert_eq!(empty, r#"{"data":""}"#);
    }
}
