use crate::domain::{DirEntry, SessionInfo, Worktree, sanitize_worktree_name};

const EXACT_PREFERRED: i64 = 1_000_000;
const EXACT_OTHER: i64 = 950_000;
const PREFIX_PREFERRED: i64 = 900_000;
const PREFIX_OTHER: i64 = 850_000;
const MATCH_POINTS: i64 = 100;
const ADJACENT_BONUS: i64 = 35;
const ALIGNED_BONUS: i64 = 20;
const LEADING_BONUS: i64 = 15;

/// Scores one field against an already lowercased pattern.
pub fn score_field(text: &str, pattern: &str, preferred: bool) -> Option<i64> {
    let text = text.to_lowercase();
    if text == pattern {
        return Some(if preferred { EXACT_PREFERRED } else { EXACT_OTHER });
    }
    if text.starts_with(pattern) {
        return Some(if preferred {
            PREFIX_PREFERRED
        } else {
            PREFIX_OTHER
        });
    }
    subsequence_score(&text, pattern)
}

fn subsequence_score(text: &str, pattern: &str) -> Option<i64> {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    if pattern_chars.is_empty() {
        return None;
    }

    let mut score = 0i64;
    let mut pattern_index = 0usize;
    let mut previous_match: Option<usize> = None;
    let mut text_len = 0usize;

    for (position, character) in text.chars().enumerate() {
        text_len = position + 1;
        if pattern_index >= pattern_chars.len() || character != pattern_chars[pattern_index] {
            continue;
        }

        score += MATCH_POINTS;
        if previous_match.is_some_and(|previous| previous + 1 == position) {
            score += ADJACENT_BONUS;
        }
        if position == pattern_index {
            score += ALIGNED_BONUS;
        }
        if position == 0 {
            score += LEADING_BONUS;
        }
        previous_match = Some(position);
        pattern_index += 1;
    }

    if pattern_index < pattern_chars.len() {
        return None;
    }

    let gap = i64::try_from(text_len.saturating_sub(pattern_chars.len())).unwrap_or(i64::MAX);
    Some(score.saturating_sub(gap))
}

fn best_of(fields: &[(&str, bool)], pattern: &str) -> Option<i64> {
    fields
        .iter()
        .filter_map(|(text, preferred)| score_field(text, pattern, *preferred))
        .max()
}

fn normalized_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Keeps matching items ordered by score, ties in input order. An empty
/// query returns the input as is.
pub fn rank<T, F>(items: &[T], query: &str, score: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &str) -> Option<i64>,
{
    let Some(pattern) = normalized_query(query) else {
        return items.to_vec();
    };

    let mut scored: Vec<(i64, &T)> = items
        .iter()
        .filter_map(|item| score(item, &pattern).map(|value| (value, item)))
        .collect();
    scored.sort_by(|left, right| right.0.cmp(&left.0));
    scored.into_iter().map(|(_, item)| item.clone()).collect()
}

pub fn score_dir(entry: &DirEntry, pattern: &str) -> Option<i64> {
    let path = entry.path.to_string_lossy();
    best_of(&[(entry.name.as_str(), true), (path.as_ref(), false)], pattern)
}

pub fn score_worktree(worktree: &Worktree, pattern: &str) -> Option<i64> {
    let direct = best_of(
        &[
            (worktree.name.as_str(), true),
            (worktree.branch.as_str(), true),
        ],
        pattern,
    );
    let sanitized_branch = sanitize_worktree_name(&worktree.branch);
    let sanitized_pattern = sanitize_worktree_name(pattern);
    let sanitized = score_field(&sanitized_branch, &sanitized_pattern, true);
    direct.max(sanitized)
}

pub fn score_tool(tool: &String, pattern: &str) -> Option<i64> {
    score_field(tool, pattern, true)
}

pub fn score_session(session: &SessionInfo, pattern: &str) -> Option<i64> {
    let dir = session.dir_path.to_string_lossy();
    best_of(
        &[
            (session.name.as_str(), true),
            (dir.as_ref(), false),
            (session.project.as_deref().unwrap_or_default(), false),
            (session.branch.as_deref().unwrap_or_default(), false),
            (session.tool.as_str(), false),
        ],
        pattern,
    )
}

/// Ranked projects; each kept entry carries its score.
pub fn filter_dirs(dirs: &[DirEntry], query: &str) -> Vec<DirEntry> {
    let Some(pattern) = normalized_query(query) else {
        return dirs.to_vec();
    };
    rank(dirs, query, score_dir)
        .into_iter()
        .map(|mut entry| {
            entry.score = score_dir(&entry, &pattern).unwrap_or_default();
            entry
        })
        .collect()
}

pub fn filter_worktrees(worktrees: &[Worktree], query: &str) -> Vec<Worktree> {
    rank(worktrees, query, score_worktree)
}

pub fn filter_tools(tools: &[String], query: &str) -> Vec<String> {
    rank(tools, query, score_tool)
}

pub fn filter_sessions(sessions: &[SessionInfo], query: &str) -> Vec<SessionInfo> {
    rank(sessions, query, score_session)
}
