use serde::Deserialize;
use serde_json::Value;

use crate::error::CheckError;
use crate::json_stream::JsonStreamParser;

/// One entry of the remote release manifest. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireRecord")]
pub struct ReleaseRecord {
    pub revision: i64,
    pub url: String,
    pub name: String,
    pub body: String,
}

/// `svnRevision` wins when a record carries both revision keys.
#[derive(Deserialize)]
struct WireRecord {
    #[serde(rename = "svnRevision")]
    svn_revision: Option<i64>,
    revision: Option<i64>,
    url: String,
    name: String,
    body: String,
}

impl TryFrom<WireRecord> for ReleaseRecord {
    type Error = &'static str;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let revision = wire
            .svn_revision
            .or(wire.revision)
            .ok_or("missing field `svnRevision`")?;
        Ok(Self {
            revision,
            url: wire.url,
            name: wire.name,
            body: wire.body,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDescription {
    pub url: String,
    pub title: String,
    pub body: String,
}

impl From<ReleaseRecord> for UpdateDescription {
    fn from(record: ReleaseRecord) -> Self {
        Self {
            url: record.url,
            title: record.name,
            body: record.body,
        }
    }
}

/// Keep the releases strictly newer than `current_revision`, in manifest
/// order.
///
/// # Errors
/// Returns [`CheckError::MalformedRecord`] when the manifest is not an array or
/// any record lacks a required field.
pub fn filter_releases(
    manifest: Value,
    current_revision: i64,
) -> Result<Vec<UpdateDescription>, CheckError> {
    let Value::Array(entries) = manifest else {
        return Err(CheckError::malformed("expected an array of releases"));
    };

    let mut updates = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let record: ReleaseRecord = serde_json::from_value(entry)
            .map_err(|error| CheckError::malformed(format!("release {index}: {error}")))?;
        if record.revision > current_revision {
            updates.push(record.into());
        }
    }
    Ok(updates)
}

/// Parse an already-chunked manifest body and filter it.
///
/// # Errors
/// Returns [`CheckError::Parse`] for invalid JSON and
/// [`CheckError::MalformedRecord`] for records of the wrong shape.
pub fn parse_manifest<'a, I>(
    chunks: I,
    current_revision: i64,
) -> Result<Vec<UpdateDescription>, CheckError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut parser = JsonStreamParser::new();
    for chunk in chunks {
        parser.write(chunk)?;
    }
    filter_releases(parser.finish()?, current_revision)
}
