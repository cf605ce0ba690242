//! Query translator trait: turns a structured query into query-language text.
//!
//! Hosts usually back this with a remote call. It is optional everywhere:
//! without one, structured queries are traced in their object form.

use crate::error::TranslateError;
use crate::query::QueryExpression;

pub trait QueryTranslator: Send + Sync {
    /// Convert the query to its textual form (FetchXML on the platform).
    fn translate(&self, query: &QueryExpression) -> Result<String, TranslateError>;
}

impl<F> QueryTranslator for F
where
    F: Fn(&QueryExpression) -> Result<String, TranslateError> + Send + Sync,
{
    fn translate(&self, query: &QueryExpression) -> Result<String, TranslateError> {
        self(query)
    }
}
