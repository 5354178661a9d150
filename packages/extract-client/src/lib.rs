//! Structured query builder and asynchronous extract client.
//!
//! Builds ad-hoc filters over a typed record schema, runs them as paginated
//! preview searches, and submits them as bulk extract jobs that are followed
//! by polling until the server reports a result.
//!
//! # Example
//!
//! ```rust,ignore
//! use extract_client::{
//!     ClientConfig, CombinePolicy, CriteriaModel, DataSlice, ExtractJobClient,
//!     HttpExtractApi, MemorySchema, QueryExecutor,
//! };
//! use std::sync::Arc;
//!
//! let config = ClientConfig::from_env()?;
//! let api = Arc::new(HttpExtractApi::new(&config)?);
//!
//! let mut criteria = CriteriaModel::new(Arc::new(schema), CombinePolicy::All);
//! criteria.set_column(0, "Demographics");
//! criteria.set_field(0, "sex");
//! criteria.set_query_type(0, "Equals");
//! criteria.set_query(0, "Male");
//!
//! // Preview the second page
//! let executor = QueryExecutor::new(api.clone());
//! let outcome = executor.execute(&criteria, 2).await?;
//!
//! // Bulk extract
//! let mut jobs = ExtractJobClient::new(api, config.poll.clone());
//! let slice = DataSlice::new().with("Demographics", "sex");
//! jobs.run(&criteria.normalized_clauses(), &slice).await?;
//! let artifact = jobs.request_download().await?;
//! ```
//!
//! # Modules
//!
//! - [`criteria`] - Editable clause list, normalization, field classification
//! - [`query`] - Preview search with stale-response protection
//! - [`job`] - Extract submission and status polling
//! - [`filters`] - Saved filter list
//! - [`session`] - Everything above wired together for one search screen
//! - [`http`] - `reqwest` transport
//! - [`stores`] - In-memory schema and filter store
//! - [`testing`] - Scripted transport for tests

pub mod config;
pub mod criteria;
pub mod error;
pub mod filters;
pub mod http;
pub mod job;
pub mod query;
pub mod session;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

pub use config::{ClientConfig, PollConfig};
pub use criteria::{readable_query_type, CriteriaModel};
pub use error::{ExtractError, Result};
pub use filters::SavedFilters;
pub use http::HttpExtractApi;
pub use job::ExtractJobClient;
pub use query::{QueryExecutor, SearchOutcome, SearchState};
pub use session::ExtractSession;
pub use stores::{MemoryFilterStore, MemorySchema};
pub use traits::{ExtractApi, SavedFilterStore, SchemaLookup};
pub use types::{
    clause::{Clause, ClauseField, Combine, CombinePolicy},
    filter::SavedFilter,
    job::{ExtractId, ExtractJob, ExtractRequest, ExtractStatus, ExtractSubmitted, JobPhase, RemoteState},
    schema::{FieldSpec, FieldType},
    search::{PaginationStyle, SearchPage, SearchRequest},
    slice::DataSlice,
};
