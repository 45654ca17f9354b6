/*
 * Responsibility
 * - ドメインロジック (token, admission, ownership, use-cases)
 * - HTTP には依存させない (AppError への変換だけ)
 */
pub mod accounts;
pub mod admission;
pub mod auth;
pub mod ownership;
pub mod snippets;
