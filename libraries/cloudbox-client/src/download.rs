//! File download and Content-Disposition handling.

use crate::client::{check_response, map_send_error};
use crate::error::Result;
use crate::files::{encode_id, FilesClient};
use crate::types::DownloadedFile;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Method;
use tracing::{debug, info};

impl FilesClient<'_> {
    /// Download a file's bytes.
    ///
    /// The file name comes from the `Content-Disposition` header when the
    /// server sends one, otherwise it is `file-<id>`.
    pub async fn download(&self, file_id: &str) -> Result<DownloadedFile> {
        let path = format!("/files/{}/download", encode_id(file_id));
        debug!(file_id = %file_id, "Downloading file");

        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = check_response(response).await?;

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| fallback_file_name(file_id));

        let contents = response.bytes().await.map_err(map_send_error)?;

        info!(
            file_id = %file_id,
            file = %file_name,
            size = contents.len(),
            "File downloaded"
        );

        Ok(DownloadedFile {
            file_id: file_id.to_string(),
            file_name,
            contents,
        })
    }
}

/// Name used when the server does not supply one.
pub fn fallback_file_name(file_id: &str) -> String {
    format!("file-{}", file_id)
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// `filename*=` (RFC 5987) wins over `filename=`. Quoted values may contain
/// `;` and backslash escapes. Values are unquoted and percent-decoded;
/// undecodable values are returned as sent.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in split_parameters(header) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim();
        let value = unquote(value.trim());

        if name.eq_ignore_ascii_case("filename*") {
            // charset'language'encoded-value
            let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value.as_str());
            extended = Some(decode(encoded));
        } else if name.eq_ignore_ascii_case("filename") {
            plain = Some(decode(&value));
        }
    }

    extended.or(plain).filter(|name| !name.is_empty())
}

/// Split on `;` outside of quoted strings.
fn split_parameters(header: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in header.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(header[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(header[start..].trim());
    params
}

/// Strip surrounding quotes and resolve `\x` escapes inside them.
fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_filename() {
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="report.pdf""#).as_deref(),
            Some("report.pdf")
        );
    }

    #[test]
    fn test_unquoted_and_encoded_filename() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=my%20notes.txt").as_deref(),
            Some("my notes.txt")
        );
    }

    #[test]
    fn test_semicolon_inside_quotes() {
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="q1;q2.pdf""#).as_deref(),
            Some("q1;q2.pdf")
        );
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="a;b.txt"; size=3"#)
                .as_deref(),
            Some("a;b.txt")
        );
    }

    #[test]
    fn test_escaped_quote_inside_filename() {
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="say \"hi\";.txt""#)
                .as_deref(),
            Some(r#"say "hi";.txt"#)
        );
    }

    #[test]
    fn test_extended_filename_wins() {
        let header =
            r#"attachment; filename="fallback.txt"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"#;
        assert_eq!(
            filename_from_content_disposition(header).as_deref(),
            Some("résumé.pdf")
        );
    }

    #[test]
    fn test_missing_or_empty_filename() {
        assert!(filename_from_content_disposition("attachment").is_none());
        assert!(filename_from_content_disposition(r#"attachment; filename="""#).is_none());
        assert!(filename_from_content_disposition("inline; name=field").is_none());
    }

    #[test]
    fn test_bad_percent_encoding_is_kept() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=100%.txt").as_deref(),
            Some("100%.txt")
        );
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(fallback_file_name("42"), "file-42");
    }
}
