use crate::{BackendError, UpliftResult, output_formats};
use std::io::{Cursor, Read};

/// Reads the known output members out of a `/json-uplift` zip response.
pub fn extract_uplift_archive(bytes: &[u8]) -> Result<UpliftResult, BackendError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|error| BackendError::Archive(format!("failed to open archive: {error}")))?;

    let mut result = UpliftResult::new();
    for format in output_formats() {
        let mut member = archive.by_name(format.file_name).map_err(|error| {
            BackendError::Archive(format!(
                "failed to read member '{}': {error}",
                format.file_name
            ))
        })?;
        let mut text = String::new();
        member.read_to_string(&mut text).map_err(|error| {
            BackendError::Archive(format!(
                "member '{}' is not valid UTF-8 text: {error}",
                format.file_name
            ))
        })?;
        result.insert(format.value.to_string(), text);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_archive(members: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in members {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("member should start");
            writer
                .write_all(body.as_bytes())
                .expect("member should be written");
        }
        writer
            .finish()
            .expect("archive should finish")
            .into_inner()
    }

    #[test]
    fn extract_uplift_archive_all_members_expected_known_formats_only() {
        let bytes = build_archive(&[
            ("ttl.ttl", "<urn:a> <urn:b> <urn:c> ."),
            ("expanded.jsonld", "[]"),
            ("uplifted.jsonld", "{\"@id\":\"urn:a\"}"),
        ]);

        let result = extract_uplift_archive(&bytes).expect("archive should extract");

        assert_eq!(result.len(), 2);
        assert_eq!(
            result.get("ttl").map(String::as_str),
            Some("<urn:a> <urn:b> <urn:c> .")
        );
        assert_eq!(
            result.get("json").map(String::as_str),
            Some("{\"@id\":\"urn:a\"}")
        );
    }

    #[test]
    fn extract_uplift_archive_missing_member_expected_archive_error() {
        let bytes = build_archive(&[("ttl.ttl", "")]);
        let error = extract_uplift_archive(&bytes).expect_err("missing member should fail");
        assert!(matches!(error, BackendError::Archive(message) if message.contains("uplifted.jsonld")));
    }

    #[test]
    fn extract_uplift_archive_not_a_zip_expected_archive_error() {
        let error = extract_uplift_archive(b"{\"detail\":\"nope\"}")
            .expect_err("non-zip bytes should fail");
        assert!(matches!(error, BackendError::Archive(_)));
    }
}
