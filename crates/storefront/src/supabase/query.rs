//! PostgREST query builder.

use std::fmt::Display;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::{SessionToken, SupabaseClient, SupabaseError, parse_body};

/// Sort direction for [`Query::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Parameters that shape the response rather than filter rows.
const NON_FILTER_PARAMS: &[&str] = &["select", "order", "limit", "offset"];

/// A query against one table, built up fluently and consumed by one of the
/// terminal operations (`fetch`, `insert`, `update`, `delete`, ...).
#[must_use = "a query does nothing until a terminal operation runs it"]
pub struct Query<'a> {
    client: &'a SupabaseClient,
    table: String,
    params: Vec<(String, String)>,
    bearer: Option<String>,
}

impl<'a> Query<'a> {
    pub(super) fn new(client: &'a SupabaseClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            params: Vec::new(),
            bearer: None,
        }
    }

    /// Columns to return, including embedded relations (`*,categories(slug)`).
    pub fn select(mut self, columns: &str) -> Self {
        self.params.retain(|(k, _)| k != "select");
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    /// Keep rows where `column` equals `value`.
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.params.push((
            "order".to_string(),
            format!("{column}.{}", direction.as_str()),
        ));
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.params.retain(|(k, _)| k != "limit");
        self.params.push(("limit".to_string(), count.to_string()));
        self
    }

    /// Run as the signed-in user. `None` keeps the anonymous key.
    pub fn auth(mut self, token: Option<&SessionToken>) -> Self {
        self.bearer = token.map(|t| t.expose().to_string());
        self
    }

    /// Query parameters in the order they were added.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    fn has_filter(&self) -> bool {
        self.params
            .iter()
            .any(|(k, _)| !NON_FILTER_PARAMS.contains(&k.as_str()))
    }

    fn url(&self) -> Result<Url, SupabaseError> {
        let mut url = self.client.rest_url(&self.table)?;
        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method) -> Result<reqwest::RequestBuilder, SupabaseError> {
        Ok(self
            .client
            .request(method, self.url()?, self.bearer.as_deref()))
    }

    fn require_filter(&self, operation: &'static str) -> Result<(), SupabaseError> {
        if self.has_filter() {
            Ok(())
        } else {
            Err(SupabaseError::UnfilteredWrite {
                operation,
                table: self.table.clone(),
            })
        }
    }

    // =========================================================================
    // Terminal operations
    // =========================================================================

    /// Fetch every matching row.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the request fails or rows do not
    /// deserialize into `T`.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, SupabaseError> {
        let request = self.request(Method::GET)?;
        let body = self.client.send(request).await?;
        parse_body(&body)
    }

    /// Fetch exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` when no row matches.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<T, SupabaseError> {
        let request = self
            .request(Method::GET)?
            .header("Accept", "application/vnd.pgrst.object+json");
        match self.client.send(request).await {
            Ok(body) => parse_body(&body),
            Err(SupabaseError::NotFound(_)) => Err(SupabaseError::NotFound(self.table)),
            Err(e) => Err(e),
        }
    }

    /// Fetch the first matching row, if any.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the request fails.
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>, SupabaseError> {
        let rows: Vec<T> = self.limit(1).fetch().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row (an object) or several (an array).
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the backend rejects the insert.
    #[instrument(skip(self, rows), fields(table = %self.table))]
    pub async fn insert<B: Serialize + ?Sized + Sync>(self, rows: &B) -> Result<(), SupabaseError> {
        let request = self
            .request(Method::POST)?
            .header("Prefer", "return=minimal")
            .json(rows);
        self.client.send(request).await?;
        Ok(())
    }

    /// Insert and return the stored rows (with generated ids and defaults).
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the backend rejects the insert.
    #[instrument(skip(self, rows), fields(table = %self.table))]
    pub async fn insert_returning<B, T>(self, rows: &B) -> Result<Vec<T>, SupabaseError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::POST)?
            .header("Prefer", "return=representation")
            .json(rows);
        let body = self.client.send(request).await?;
        parse_body(&body)
    }

    /// Apply `changes` to every matching row.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::UnfilteredWrite` when no filter was given.
    #[instrument(skip(self, changes), fields(table = %self.table))]
    pub async fn update<B: Serialize + ?Sized + Sync>(
        self,
        changes: &B,
    ) -> Result<(), SupabaseError> {
        self.require_filter("update")?;
        let request = self
            .request(Method::PATCH)?
            .header("Prefer", "return=minimal")
            .json(changes);
        self.client.send(request).await?;
        Ok(())
    }

    /// Delete every matching row.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::UnfilteredWrite` when no filter was given.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn delete(self) -> Result<(), SupabaseError> {
        self.require_filter("delete")?;
        let request = self.request(Method::DELETE)?;
        self.client.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::SupabaseConfig;

    fn client() -> SupabaseClient {
        let config =
            SupabaseConfig::new("https://abc.supabase.co", SecretString::from("anon")).unwrap();
        SupabaseClient::new(&config)
    }

    #[test]
    fn test_url_renders_postgrest_params() {
        let client = client();
        let query = client
            .table("products")
            .select("*,categories(slug)")
            .eq("is_bestseller", true)
            .order("created_at", Direction::Desc)
            .limit(4);

        let url = query.url().unwrap();
        assert_eq!(url.path(), "/rest/v1/products");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "*,categories(slug)".to_string()),
                ("is_bestseller".to_string(), "eq.true".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "4".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_and_limit_replace_previous_values() {
        let client = client();
        let query = client.table("t").select("a").select("b").limit(1).limit(2);
        assert_eq!(
            query.params(),
            &[
                ("select".to_string(), "b".to_string()),
                ("limit".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_filter_detection() {
        let client = client();
        assert!(!client.table("t").select("*").limit(1).has_filter());
        assert!(client.table("t").eq("id", 1).has_filter());
    }

    #[tokio::test]
    async fn test_unfiltered_delete_is_refused() {
        let client = client();
        let err = client.table("cart_items").delete().await.unwrap_err();
        assert!(matches!(
            err,
            SupabaseError::UnfilteredWrite {
                operation: "delete",
                ..
            }
        ));
    }
}
