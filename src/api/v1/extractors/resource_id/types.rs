/**
 * Responsibility
 *  - リソースごとの「意味付きID型」を宣言する
 *
 * 置くもの
 *  - SnippetTag などのタグ型
 *  - type SnippetId = ResourceId<SnippetTag> のような alias
 *
 * 置かないもの
 *  - parse ロジック / extractor 実装
 */
use super::core::ResourceId;

// snippets
pub enum SnippetTag {}
pub type SnippetId = ResourceId<SnippetTag>;
