//! # Find-or-Create Module / 查找或创建模块
//!
//! One entity per distinct name per scope, created lazily: look the name up,
//! create only when the lookup comes back empty.
//!
//! 每个作用域内每个不同名称只对应一个实体，延迟创建：先按名称查找，
//! 仅在查找结果为空时创建。

use std::future::Future;

/// The entity a lookup settled on and whether this run created it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub entity: T,
    pub created: bool,
}

/// Returns `found` when present, otherwise awaits `create`.
/// `create` is never called when `found` is `Some`.
///
/// 如果 `found` 存在则返回它，否则等待 `create` 的结果。
/// 当 `found` 为 `Some` 时永远不会调用 `create`。
pub async fn find_or_create<T, E, F, Fut>(found: Option<T>, create: F) -> Result<Resolved<T>, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match found {
        Some(entity) => Ok(Resolved {
            entity,
            created: false,
        }),
        None => Ok(Resolved {
            entity: create().await?,
            created: true,
        }),
    }
}

/// Finds an entity by exact name in a locally known collection.
pub fn find_named<'a, T, N>(items: &'a [T], name: &str, name_of: N) -> Option<&'a T>
where
    N: Fn(&T) -> &str,
{
    items.iter().find(|item| name_of(item) == name)
}
