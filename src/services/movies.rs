use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Movie, NewMovie, Showtime};
use crate::store::{constraints, Store, StoreError, StoreTx};

use super::{finish, guard};

fn title_clash(err: StoreError) -> ServiceError {
    if err.is_unique_violation(constraints::MOVIE_TITLE) {
        ServiceError::AlreadyExists("movie")
    } else {
        ServiceError::Store(err)
    }
}

pub async fn create_movie(store: &dyn Store, movie: NewMovie) -> ServiceResult<Movie> {
    if movie.title.trim().is_empty() {
        return Err(ServiceError::InvalidInput("movie title must not be empty".into()));
    }
    let mut tx = store.begin().await?;
    let result = tx.insert_movie(&movie).await.map_err(title_clash);
    let created = finish(tx, result).await?;
    info!("movie {} created: {}", created.id, created.title);
    Ok(created)
}

pub async fn get_movie(store: &dyn Store, id: i64) -> ServiceResult<Movie> {
    let mut tx = store.begin().await?;
    let result = match tx.movie_by_id(id).await {
        Ok(Some(movie)) => Ok(movie),
        Ok(None) => Err(ServiceError::NotFound("movie")),
        Err(e) => Err(e.into()),
    };
    finish(tx, result).await
}

pub async fn list_movies(store: &dyn Store) -> ServiceResult<Vec<Movie>> {
    let mut tx = store.begin().await?;
    let result = tx.list_movies().await.map_err(ServiceError::from);
    finish(tx, result).await
}

pub async fn movie_showtimes(store: &dyn Store, movie_id: i64) -> ServiceResult<Vec<Showtime>> {
    let mut tx = store.begin().await?;
    let result = showtimes_in(tx.as_mut(), movie_id).await;
    finish(tx, result).await
}

async fn showtimes_in(tx: &mut dyn StoreTx, movie_id: i64) -> ServiceResult<Vec<Showtime>> {
    if tx.movie_by_id(movie_id).await?.is_none() {
        return Err(ServiceError::NotFound("movie"));
    }
    Ok(tx.showtimes_by_movie(movie_id).await?)
}

pub async fn update_movie(store: &dyn Store, movie: Movie) -> ServiceResult<()> {
    if movie.title.trim().is_empty() {
        return Err(ServiceError::InvalidInput("movie title must not be empty".into()));
    }
    let mut tx = store.begin().await?;
    let result = update_in(tx.as_mut(), &movie).await;
    finish(tx, result).await?;
    info!("movie {} updated", movie.id);
    Ok(())
}

async fn update_in(tx: &mut dyn StoreTx, movie: &Movie) -> ServiceResult<()> {
    if tx.movie_by_id_for_update(movie.id).await?.is_none() {
        return Err(ServiceError::NotFound("movie"));
    }
    guard::ensure_movie_unreferenced(tx, movie.id).await?;
    tx.update_movie(movie).await.map_err(title_clash)
}

pub async fn delete_movie(store: &dyn Store, id: i64) -> ServiceResult<()> {
    let mut tx = store.begin().await?;
    let result = delete_in(tx.as_mut(), id).await;
    finish(tx, result).await?;
    info!("movie {} deleted", id);
    Ok(())
}

async fn delete_in(tx: &mut dyn StoreTx, id: i64) -> ServiceResult<()> {
    if tx.movie_by_id_for_update(id).await?.is_none() {
        return Err(ServiceError::NotFound("movie"));
    }
    guard::ensure_movie_unreferenced(tx, id).await?;
    if !tx
        .delete_movie(id)
        .await
        .map_err(|e| guard::restricted(e, "movie"))?
    {
        return Err(ServiceError::NotFound("movie"));
    }
    Ok(())
}
