use super::TmdbClient;
use crate::error::{ParityError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    id: i64,
    name: String,
}

/// Movie genre lookups
pub struct GenreApi {
    client: TmdbClient,
}

impl GenreApi {
    pub fn new(client: TmdbClient) -> Self {
        Self { client }
    }

    /// Genre id to display name
    pub async fn genres(&self) -> Result<BTreeMap<i64, String>> {
        let body = self.client.get_json("/genre/movie/list", &[]).await?;
        let list: GenreList = serde_json::from_value(body)
            .map_err(|e| ParityError::InvalidResponse(format!("genre list: {}", e)))?;
        Ok(list.genres.into_iter().map(|g| (g.id, g.name)).collect())
    }
}
