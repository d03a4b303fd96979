#![doc = r#"
Playground backend capabilities and clients.

Operation mapping:

| Capability | Backend API |
| --- | --- |
| `ContentFetcher::fetch_text` | `GET <url>` (absolute URL, or a path under the backend base URL) |
| `UpliftConverter::json_uplift` | `POST /json-uplift` multipart (`output`, `context`, `json`), zip response |
| `ProfileSource::profiles` | `GET /profiles` |
| `RemoteFetchPolicySource::remote_fetch_policy` | `GET /remote-fetch` |

Implementation notes:
- `json_uplift` always requests the `all` output and extracts exactly the members listed in
  `output_formats()`; any other archive member is ignored.
- Non-2xx responses keep their body text in `BackendError::Status` so callers can extract
  server-provided messages.
- `MockBackend` implements every capability in memory and is what the tests use.
"#]

pub mod archive;
pub mod client;
pub mod config;
pub mod errors;
pub mod formats;
pub mod service;
pub mod testing;

pub use archive::extract_uplift_archive;
pub use client::ReqwestBackend;
pub use config::{BACKEND_URL_ENV, BackendConfig, DEFAULT_BACKEND_URL};
pub use errors::BackendError;
pub use formats::{OutputSelector, UPLIFT_OUTPUT_FORMATS, UpliftOutputFormat, find_output_format, output_formats};
pub use service::{
    ContentFetcher, ContextFetchKind, ContextFetchPolicy, ProfileMap, ProfileSource,
    RemoteFetchPolicy, RemoteFetchPolicySource, SharedContentFetcher, SharedUpliftConverter,
    UpliftConverter, UpliftResult,
};
pub use testing::{MockBackend, UpliftCall};
