//! Author directory and article-author linker
//!
//! The directory maps a canonical name string to a stable author identity,
//! find-or-create, shared across all users. The linker maintains the
//! many-to-many relation for an article and the cached display string,
//! always on the caller's transaction so both representations commit or
//! roll back together.

use crate::authors::{display_string, normalize_authors, AuthorInput};
use crate::db::Repository;
use crate::errors::{AppError, Result};
use sea_orm::ConnectionTrait;
use uuid::Uuid;

/// Attempt bound for the insert-or-fetch window. Only reachable if an author
/// row disappears between a conflicting insert and the follow-up fetch, and
/// author rows are never deleted.
const RESOLVE_ATTEMPTS: u32 = 3;

/// Resolve an ordered name list to ordered author ids, creating missing
/// authors on the way.
///
/// Creation is an atomic insert-or-fetch: `ON CONFLICT (name) DO NOTHING
/// RETURNING id`, falling back to a lookup when a concurrent writer won the
/// insert. A name appearing twice resolves to the same id both times.
pub async fn resolve_authors<C: ConnectionTrait>(
    repo: &Repository,
    conn: &C,
    names: &[String],
) -> Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(names.len());

    for name in names {
        ids.push(resolve_one(repo, conn, name).await?);
    }

    Ok(ids)
}

async fn resolve_one<C: ConnectionTrait>(
    repo: &Repository,
    conn: &C,
    name: &str,
) -> Result<Uuid> {
    for _ in 0..RESOLVE_ATTEMPTS {
        if let Some(author) = repo.find_author_by_name(conn, name).await? {
            return Ok(author.id);
        }

        match repo.insert_author_if_absent(conn, name).await? {
            Some(id) => {
                crate::metrics::record_author_created();
                tracing::debug!(author_id = %id, name = %name, "Author created");
                return Ok(id);
            }
            // A concurrent writer inserted this name first; fetch theirs.
            None => continue,
        }
    }

    Err(AppError::IdentityRace {
        name: name.to_string(),
        attempts: RESOLVE_ATTEMPTS,
    })
}

/// Replace an article's author set from raw input and recompute the cached
/// display string, returning the persisted display value.
///
/// Replace strategy: every existing link is deleted, then one link per
/// resolved author is inserted (duplicate pairs ignored). Runs entirely on
/// the caller's transaction alongside the article write that triggered it.
pub async fn set_article_authors<C: ConnectionTrait>(
    repo: &Repository,
    conn: &C,
    article_id: Uuid,
    input: &AuthorInput,
) -> Result<String> {
    let names = normalize_authors(input);
    let author_ids = resolve_authors(repo, conn, &names).await?;

    repo.clear_article_authors(conn, article_id).await?;
    for author_id in &author_ids {
        repo.link_article_author(conn, article_id, *author_id).await?;
    }

    let display = display_string(&names);
    repo.set_authors_display(conn, article_id, &display).await?;

    Ok(display)
}
