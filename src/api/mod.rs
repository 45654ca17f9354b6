/*
 * Responsibility
 * - API version ごとの module を束ねる
 */
pub mod v1;
