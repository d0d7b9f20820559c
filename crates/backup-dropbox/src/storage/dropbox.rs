use std::io::{ErrorKind, Read};

use reqwest::{
    blocking::{Client, Response},
    header::CONTENT_TYPE,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use super::{ListPage, RemoteEntry, RemoteStorage, StorageError};

const API_URL: &str = "https://api.dropboxapi.com/2";
const CONTENT_URL: &str = "https://content.dropboxapi.com/2";

/// Uploads are sent in chunks of this size, anything larger than a single chunk goes through an
/// upload session.
const CHUNK_BYTES: usize = 8 * 1024 * 1024;

/// A Dropbox client using the HTTP API v2.
pub struct Dropbox {
    /// The HTTP client.
    client: Client,

    /// The OAuth access token.
    token: String,

    /// Base URL for RPC endpoints.
    api_url: String,

    /// Base URL for content upload endpoints.
    content_url: String,
}

impl Dropbox {
    /// The size of each request body when uploading through a session.
    pub const CHUNK_BYTES: usize = CHUNK_BYTES;

    /// Create a client, `client_identifier` is sent as the user agent.
    pub fn new(client_identifier: &str, token: &str) -> Result<Self, StorageError> {
        let client = Client::builder().user_agent(client_identifier).build()?;

        Ok(Self {
            client,
            token: token.to_string(),
            api_url: API_URL.to_string(),
            content_url: CONTENT_URL.to_string(),
        })
    }

    /// Send requests to different base URLs, e.g. through a proxy.
    pub fn with_base_urls(mut self, api_url: &str, content_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self.content_url = content_url.trim_end_matches('/').to_string();
        self
    }

    /// Call an RPC endpoint with a JSON argument.
    fn rpc<Arg: Serialize, Output: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        argument: &Arg,
    ) -> Result<Output, StorageError> {
        debug!("POST {endpoint}");

        let response = self
            .client
            .post(format!("{}/{endpoint}", self.api_url))
            .bearer_auth(&self.token)
            .json(argument)
            .send()?;

        Ok(check_status(endpoint, response)?.json()?)
    }

    /// Call a content upload endpoint, the argument travels in the `Dropbox-API-Arg` header.
    fn content<Arg: Serialize, Output: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        argument: &Arg,
        body: Vec<u8>,
    ) -> Result<Output, StorageError> {
        debug!("POST {endpoint} with {} bytes", body.len());

        let response = self
            .client
            .post(format!("{}/{endpoint}", self.content_url))
            .bearer_auth(&self.token)
            .header("Dropbox-API-Arg", header_safe_json(argument)?)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()?;

        Ok(check_status(endpoint, response)?.json()?)
    }
}

impl RemoteStorage for Dropbox {
    fn list(&mut self, cursor: Option<&str>) -> Result<ListPage, StorageError> {
        let result: ListFolderResult = match cursor {
            Some(cursor) => {
                self.rpc("files/list_folder/continue", &ListFolderContinueArg { cursor })?
            }
            None => self.rpc(
                "files/list_folder",
                &ListFolderArg {
                    path: "",
                    recursive: false,
                },
            )?,
        };

        Ok(result.into_page())
    }

    fn upload(&mut self, path: &str, reader: &mut dyn Read) -> Result<(), StorageError> {
        let commit = CommitInfo {
            path,
            mode: "add",
            autorename: false,
            mute: false,
        };

        // Small files go up in a single request.
        let chunk = read_chunk(reader)?;
        if chunk.len() < CHUNK_BYTES {
            let _: FileMetadata = self.content("files/upload", &commit, chunk)?;
            return Ok(());
        }

        let mut offset = u64::try_from(chunk.len())?;
        let session: UploadSessionStartResult = self.content(
            "files/upload_session/start",
            &UploadSessionStartArg { close: false },
            chunk,
        )?;

        loop {
            let chunk = read_chunk(reader)?;
            let cursor = UploadSessionCursor {
                session_id: &session.session_id,
                offset,
            };

            if chunk.len() < CHUNK_BYTES {
                let _: FileMetadata = self.content(
                    "files/upload_session/finish",
                    &UploadSessionFinishArg { cursor, commit },
                    chunk,
                )?;
                return Ok(());
            }

            let chunk_bytes = u64::try_from(chunk.len())?;
            // Responds with a JSON null.
            let _: serde_json::Value = self.content(
                "files/upload_session/append_v2",
                &UploadSessionAppendArg {
                    cursor,
                    close: false,
                },
                chunk,
            )?;
            offset += chunk_bytes;
        }
    }

    fn delete(&mut self, path: &str) -> Result<(), StorageError> {
        let _: DeleteResult = self.rpc("files/delete_v2", &DeleteArg { path })?;
        Ok(())
    }
}

/// Turn a non-success response into an error carrying its body.
fn check_status(endpoint: &'static str, response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(StorageError::Api {
        endpoint,
        status: status.as_u16(),
        body,
    })
}

/// Fill a buffer of up to `CHUNK_BYTES` from the reader, shorter only at the end of the stream.
fn read_chunk(reader: &mut dyn Read) -> Result<Vec<u8>, StorageError> {
    let mut chunk = vec![0u8; CHUNK_BYTES];
    let mut filled = 0;

    while let Some(remaining) = chunk.get_mut(filled..) {
        if remaining.is_empty() {
            break;
        }

        let bytes_read = match reader.read(remaining) {
            Ok(0) => break,
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(StorageError::Io(e, "read upload")),
        };

        filled += bytes_read;
    }

    chunk.truncate(filled);
    Ok(chunk)
}

/// Serialize an argument for the `Dropbox-API-Arg` header, which only accepts ASCII.
fn header_safe_json<Arg: Serialize>(argument: &Arg) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(argument)?;

    let mut escaped = String::with_capacity(json.len());
    for character in json.chars() {
        if character.is_ascii() && !character.is_ascii_control() {
            escaped.push(character);
            continue;
        }

        let mut units = [0u16; 2];
        for unit in character.encode_utf16(&mut units) {
            escaped.push_str(&format!("\\u{unit:04x}"));
        }
    }

    Ok(escaped)
}

#[derive(Serialize)]
struct ListFolderArg<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Serialize)]
struct ListFolderContinueArg<'a> {
    cursor: &'a str,
}

#[derive(Serialize)]
struct DeleteArg<'a> {
    path: &'a str,
}

#[derive(Serialize, Clone, Copy)]
struct CommitInfo<'a> {
    path: &'a str,
    mode: &'static str,
    autorename: bool,
    mute: bool,
}

#[derive(Serialize)]
struct UploadSessionStartArg {
    close: bool,
}

#[derive(Serialize, Clone, Copy)]
struct UploadSessionCursor<'a> {
    session_id: &'a str,
    offset: u64,
}

#[derive(Serialize)]
struct UploadSessionAppendArg<'a> {
    cursor: UploadSessionCursor<'a>,
    close: bool,
}

#[derive(Serialize)]
struct UploadSessionFinishArg<'a> {
    cursor: UploadSessionCursor<'a>,
    commit: CommitInfo<'a>,
}

#[derive(Deserialize)]
struct UploadSessionStartResult {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<Metadata>,
    cursor: String,
    has_more: bool,
}

impl ListFolderResult {
    fn into_page(self) -> ListPage {
        let entries = self
            .entries
            .into_iter()
            .map(|metadata| {
                let path = metadata
                    .path_lower
                    .or(metadata.path_display)
                    .unwrap_or_else(|| format!("/{}", metadata.name));
                RemoteEntry::new(path)
            })
            .collect();

        ListPage {
            entries,
            has_more: self.has_more,
            cursor: Some(self.cursor),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: String,
    path_lower: Option<String>,
    path_display: Option<String>,
}

#[derive(Deserialize)]
struct FileMetadata {}

#[derive(Deserialize)]
struct DeleteResult {}
