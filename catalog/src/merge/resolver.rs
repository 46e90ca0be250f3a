use tracing::debug;

use crate::error::CatalogResult;
use crate::store::base::Repository;
use crate::types::Entity;

/// Returns the entity whose natural key equals `key`, or `None`.
///
/// Has no side effects. The answer is only a hint: another unit of work may create the key
/// right after, which surfaces later as a conflict on insert or commit.
pub async fn resolve<E, U>(uow: &mut U, key: &E::Key) -> CatalogResult<Option<E>>
where
    E: Entity,
    U: Repository<E> + Send,
{
    let found = <U as Repository<E>>::find_by_key(uow, key).await?;

    match &found {
        Some(entity) => debug!(entity = E::NAME, id = %entity.id(), "resolved natural key"),
        None => debug!(entity = E::NAME, ?key, "natural key not found"),
    }

    Ok(found)
}
