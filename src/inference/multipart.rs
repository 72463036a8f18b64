//! multipart/form-data encoding for frame uploads.

use rand::RngCore;

/// A single-part form body and its matching content type.
#[derive(Debug)]
pub struct MultipartBody {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Build a form with one file part.
pub fn encode_file_part(
    field: &str,
    filename: &str,
    part_content_type: &str,
    bytes: &[u8],
) -> MultipartBody {
    let boundary = random_boundary();
    encode_with_boundary(&boundary, field, filename, part_content_type, bytes)
}

fn random_boundary() -> String {
    let mut nonce = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce);
    format!("----neuralpose{}", hex::encode(nonce))
}

fn encode_with_boundary(
    boundary: &str,
    field: &str,
    filename: &str,
    part_content_type: &str,
    bytes: &[u8],
) -> MultipartBody {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            escape_quoted(field),
            escape_quoted(filename)
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part_content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    MultipartBody {
        content_type: format!("multipart/form-data; boundary={}", boundary),
        body,
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "%22")
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_has_single_file_part() {
        let form = encode_with_boundary("XYZ", "file", "frame.jpg", "image/jpeg", b"\xFF\xD8..\xFF\xD9");
        assert_eq!(form.content_type, "multipart/form-data; boundary=XYZ");

        let mut expected = b"--XYZ\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"frame.jpg\"\r\n\
Content-Type: image/jpeg\r\n\r\n"
            .to_vec();
        expected.extend_from_slice(b"\xFF\xD8..\xFF\xD9");
        expected.extend_from_slice(b"\r\n--XYZ--\r\n");
        assert_eq!(form.body, expected);
    }

    #[test]
    fn boundaries_differ_per_body() {
        let a = encode_file_part("file", "frame.jpg", "image/jpeg", b"a");
        let b = encode_file_part("file", "frame.jpg", "image/jpeg", b"a");
        assert_ne!(a.content_type, b.content_type);
        assert!(a.content_type.starts_with("multipart/form-data; boundary=----neuralpose"));
    }

    #[test]
    fn quotes_in_filenames_are_escaped() {
        let form = encode_with_boundary("B", "file", "a\"b.jpg", "image/jpeg", b"");
        let text = String::from_utf8(form.body).unwrap();
        assert!(text.contains("filename=\"a%22b.jpg\""));
    }
}
