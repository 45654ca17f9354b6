/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - tokens: TokenCodec (署名鍵は起動時に固定、以後不変)
 *   - admission: プロセス共通の token bucket
 *   - snippets / accounts: storage backend を抱えた use-case
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;
use std::time::Duration;

use crate::repos::{snippet_repo::SnippetRepo, user_repo::UserRepo};
use crate::services::{
    accounts::AccountService,
    admission::{AdmissionController, AdmissionPolicy},
    auth::TokenCodec,
    snippets::SnippetService,
};

#[derive(Clone, Debug)]
pub struct AppState {
    pub tokens: Arc<TokenCodec>,
    pub admission: Arc<AdmissionController>,
    pub snippets: SnippetService,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(
        tokens: Arc<TokenCodec>,
        admission: Arc<AdmissionController>,
        snippets: SnippetService,
        accounts: AccountService,
    ) -> Self {
        Self {
            tokens,
            admission,
            snippets,
            accounts,
        }
    }

    /// Wire every service on top of the storage backends.
    pub fn assemble(
        snippet_repo: Arc<dyn SnippetRepo>,
        user_repo: Arc<dyn UserRepo>,
        tokens: TokenCodec,
        policy: AdmissionPolicy,
        storage_timeout: Duration,
    ) -> Self {
        let tokens = Arc::new(tokens);

        Self::new(
            Arc::clone(&tokens),
            Arc::new(AdmissionController::new(policy)),
            SnippetService::new(snippet_repo, storage_timeout),
            AccountService::new(user_repo, tokens),
        )
    }
}
