/*
 * Responsibility
 * - middleware の公開インターフェース
 * - admission (429) → auth (401) → handler の順に掛かる
 */
pub mod admission;
pub mod auth;
pub mod http;
