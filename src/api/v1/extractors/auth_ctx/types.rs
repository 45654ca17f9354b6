/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - token の検証は middleware/services 側の責務
 * - 所有者チェック (他人の snippet) は services::ownership で別途行う
 */

use uuid::Uuid;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は token の `sub` (UUID)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthCtx {
    pub user_id: Uuid,
}

impl AuthCtx {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}
