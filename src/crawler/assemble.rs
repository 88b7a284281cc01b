//! Fan-out of one visited post into output records

use crate::models::{OutputRecord, PostDetail, PostSummary};

/// One record per comment, or a single comment-less record
///
/// Records share `url`, `date`, `title` and `content`; `date` is the
/// normalized listing date.
pub fn assemble(summary: &PostSummary, detail: &PostDetail) -> Vec<OutputRecord> {
    let record = |comment: Option<String>| OutputRecord {
        url: summary.link.clone(),
        date: summary.date.clone(),
        title: detail.title.clone(),
        content: detail.content.clone(),
        comment,
    };

    if detail.comments.is_empty() {
        return vec![record(None)];
    }

    detail
        .comments
        .iter()
        .map(|comment| record(Some(comment.clone())))
        .collect()
}
