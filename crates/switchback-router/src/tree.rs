//! The path trie.
//!
//! A compressing radix tree over URL paths. Edges carry strings rather
//! than single bytes; each node keeps one child per distinct leading byte
//! plus at most one wildcard child, stored last and outside `indices`.
//! Registration enforces the ambiguity rules up front, so a request can
//! match exactly one route or none; there are no priority tie-breaks
//! between overlapping patterns at lookup time.

use std::mem;

use crate::error::RouteError;
use crate::params::{Param, Params, MATCHED_ROUTE_PATH_PARAM};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Static,
    Root,
    Param,
    CatchAll,
}

/// A radix-tree node.
///
/// `indices` holds the first byte of each non-wildcard child's `path`, in
/// child order. Children are kept sorted by descending `priority` (the
/// number of registrations passing through them) so hot edges are probed
/// first; the wildcard child, when present, always sits last.
pub(crate) struct Node<T> {
    path: String,
    indices: Vec<u8>,
    wild_child: bool,
    kind: NodeKind,
    priority: u32,
    children: Vec<Node<T>>,
    value: Option<T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            path: String::new(),
            indices: Vec::new(),
            wild_child: false,
            kind: NodeKind::Static,
            priority: 0,
            children: Vec::new(),
            value: None,
        }
    }
}

impl<T> Node<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// True until the first successful insertion.
    pub(crate) fn is_unused(&self) -> bool {
        self.path.is_empty() && self.children.is_empty() && self.value.is_none()
    }

    /// Register `value` under `pattern`.
    ///
    /// Pattern syntax is validated in full before the tree is touched, so
    /// the conflict errors that can surface mid-walk never leave a
    /// half-registered route behind.
    pub(crate) fn insert(&mut self, pattern: &str, value: T) -> Result<(), RouteError> {
        validate_pattern(pattern)?;
        self.priority += 1;

        // Empty tree: build the whole chain in one go.
        if self.path.is_empty() && self.children.is_empty() {
            self.insert_child(pattern, pattern, value)?;
            self.kind = NodeKind::Root;
            return Ok(());
        }

        let full = pattern;
        let mut path = pattern;
        let mut current = &mut *self;

        'walk: loop {
            let common = longest_common_prefix(path, &current.path);

            // The common prefix stops inside this node's edge: split it,
            // pushing the tail down into a new child. The tree is indexed
            // by bytes, so the split point must sit on a character
            // boundary of the stored edge.
            if common < current.path.len() {
                if !current.path.is_char_boundary(common) {
                    return Err(RouteError::SplitMidCharacter {
                        pattern: full.to_owned(),
                        existing: current.path.clone(),
                    });
                }
                let child = Node {
                    path: current.path[common..].to_owned(),
                    indices: mem::take(&mut current.indices),
                    wild_child: current.wild_child,
                    kind: NodeKind::Static,
                    priority: current.priority - 1,
                    children: mem::take(&mut current.children),
                    value: current.value.take(),
                };
                current.indices = vec![current.path.as_bytes()[common]];
                current.children = vec![child];
                current.path.truncate(common);
                current.wild_child = false;
            }

            // The pattern continues past this node.
            if common < path.len() {
                path = &path[common..];

                if current.wild_child {
                    // The single wildcard child is stored last. The new
                    // pattern must spell out the identical wildcard to
                    // descend through it.
                    let last = current.children.len() - 1;
                    current = &mut current.children[last];
                    current.priority += 1;

                    let n = current.path.len();
                    if path.len() >= n
                        && path.as_bytes()[..n] == *current.path.as_bytes()
                        && current.kind != NodeKind::CatchAll
                        && (n >= path.len() || path.as_bytes()[n] == b'/')
                    {
                        continue 'walk;
                    }

                    let segment = if current.kind == NodeKind::CatchAll {
                        path
                    } else {
                        path.split('/').next().unwrap_or(path)
                    };
                    let existing = format!(
                        "{}{}",
                        &full[..full.find(segment).unwrap_or(0)],
                        current.path
                    );
                    return Err(RouteError::WildcardConflict {
                        pattern: full.to_owned(),
                        existing,
                    });
                }

                let idxc = path.as_bytes()[0];

                // '/' after a param: descend into the single child.
                if current.kind == NodeKind::Param && idxc == b'/' && current.children.len() == 1 {
                    current = &mut current.children[0];
                    current.priority += 1;
                    continue 'walk;
                }

                // An existing child shares the next byte.
                if let Some(i) = current.indices.iter().position(|&c| c == idxc) {
                    let i = current.update_child_priority(i);
                    current = &mut current.children[i];
                    continue 'walk;
                }

                // No match: grow a new static child for the remainder.
                if idxc != b':' && idxc != b'*' && current.kind != NodeKind::CatchAll {
                    current.indices.push(idxc);
                    let i = current.add_child(Node::default());
                    let i = current.update_child_priority(i);
                    return current.children[i].insert_child(path, full, value);
                }

                // The remainder starts with a wildcard.
                return current.insert_child(path, full, value);
            }

            // The pattern ends exactly here.
            if current.value.is_some() {
                return Err(RouteError::DuplicateRoute {
                    pattern: full.to_owned(),
                });
            }
            current.value = Some(value);
            return Ok(());
        }
    }

    /// Append a child, keeping the wildcard child (if any) last.
    fn add_child(&mut self, child: Node<T>) -> usize {
        if self.wild_child && !self.children.is_empty() {
            let i = self.children.len() - 1;
            self.children.insert(i, child);
            i
        } else {
            self.children.push(child);
            self.children.len() - 1
        }
    }

    /// Bump the priority of child `pos` and re-sort it towards the front,
    /// keeping `indices` in lockstep. Returns the child's new position.
    fn update_child_priority(&mut self, pos: usize) -> usize {
        self.children[pos].priority += 1;
        let priority = self.children[pos].priority;

        let mut new_pos = pos;
        while new_pos > 0 && self.children[new_pos - 1].priority < priority {
            self.children.swap(new_pos - 1, new_pos);
            new_pos -= 1;
        }
        if new_pos != pos {
            let idx = self.indices.remove(pos);
            self.indices.insert(new_pos, idx);
        }
        new_pos
    }

    /// Build the node chain for `path` below `self`, alternating static
    /// runs and wildcard nodes.
    fn insert_child(&mut self, mut path: &str, full: &str, value: T) -> Result<(), RouteError> {
        let mut current = &mut *self;

        loop {
            let Some((wildcard, start)) = find_wildcard(path) else {
                // No wildcard left: the remainder is a literal edge.
                current.path = path.to_owned();
                current.value = Some(value);
                return Ok(());
            };

            // A wildcard may not shadow routes already registered below
            // this node.
            if !current.children.is_empty() {
                return Err(RouteError::WildcardConflict {
                    pattern: full.to_owned(),
                    existing: format!("{}{}", current.path, current.children[0].path),
                });
            }

            if wildcard.as_bytes()[0] == b':' {
                // Literal run before the param becomes this node's edge.
                if start > 0 {
                    current.path = path[..start].to_owned();
                    path = &path[start..];
                }

                let i = current.add_child(Node {
                    kind: NodeKind::Param,
                    path: wildcard.to_owned(),
                    ..Node::default()
                });
                current.wild_child = true;
                current = &mut current.children[i];
                current.priority += 1;

                // More pattern after the param: continue into a fresh
                // continuation child (it starts with '/').
                if wildcard.len() < path.len() {
                    path = &path[wildcard.len()..];
                    let i = current.add_child(Node {
                        priority: 1,
                        ..Node::default()
                    });
                    current = &mut current.children[i];
                    continue;
                }

                current.value = Some(value);
                return Ok(());
            }

            // Catch-all. The syntax checks ran up front; what remains is
            // the structural conflict with a registered trailing-slash
            // route ("/x/" and "/x/*y" would both match "/x/").
            if current.path.ends_with('/') {
                return Err(RouteError::WildcardConflict {
                    pattern: full.to_owned(),
                    existing: current.path.clone(),
                });
            }

            // The '/' before the catch-all joins the wildcard's edge.
            let slash = start - 1;
            current.path = path[..slash].to_owned();

            // First node: empty-path holder reached via '/', flagged so
            // lookup takes the wildcard branch.
            let i = current.add_child(Node {
                wild_child: true,
                kind: NodeKind::CatchAll,
                ..Node::default()
            });
            current.indices = vec![b'/'];
            current = &mut current.children[i];
            current.priority += 1;

            // Second node: carries the variable name and the value.
            current.children = vec![Node {
                path: path[slash..].to_owned(),
                kind: NodeKind::CatchAll,
                priority: 1,
                value: Some(value),
                ..Node::default()
            }];
            return Ok(());
        }
    }

    /// Resolve `path` to a registered value, capturing parameters along
    /// the way.
    ///
    /// The third element is the trailing-slash recommendation: no value
    /// matched, but adding or removing exactly one terminal `/` would
    /// have.
    pub(crate) fn lookup<'a>(&'a self, path: &'a str) -> (Option<&'a T>, Params<'a>, bool) {
        let mut current = self;
        let mut path = path;
        let mut params = Params::new();

        loop {
            let prefix = current.path.as_str();
            if path.len() > prefix.len() {
                if path.as_bytes()[..prefix.len()] == *prefix.as_bytes() {
                    path = &path[prefix.len()..];

                    if !current.wild_child {
                        let idxc = path.as_bytes()[0];
                        if let Some(i) = current.indices.iter().position(|&c| c == idxc) {
                            current = &current.children[i];
                            continue;
                        }

                        // Dead end; dropping a lone trailing slash would
                        // land on this node's value.
                        let tsr = path == "/" && current.value.is_some();
                        return (None, params, tsr);
                    }

                    let child = &current.children[current.children.len() - 1];
                    match child.kind {
                        NodeKind::Param => {
                            let end = path.bytes().position(|c| c == b'/').unwrap_or(path.len());
                            params.push(Param::new(&child.path[1..], &path[..end]));

                            if end < path.len() {
                                if !child.children.is_empty() {
                                    path = &path[end..];
                                    current = &child.children[0];
                                    continue;
                                }

                                // One segment too many; a lone trailing
                                // slash is fixable.
                                let tsr = path.len() == end + 1;
                                return (None, params, tsr);
                            }

                            if let Some(value) = &child.value {
                                return (Some(value), params, false);
                            }
                            if child.children.len() == 1 {
                                let grand = &child.children[0];
                                let tsr = (grand.path == "/" && grand.value.is_some())
                                    || (grand.path.is_empty() && grand.indices == [b'/']);
                                return (None, params, tsr);
                            }
                            return (None, params, false);
                        }
                        NodeKind::CatchAll => {
                            params.push(Param::new(&child.path[2..], path));
                            return (child.value.as_ref(), params, false);
                        }
                        NodeKind::Static | NodeKind::Root => {
                            unreachable!("wildcard child must be param or catch-all")
                        }
                    }
                }
            } else if path == prefix {
                // The path ends on this node.
                if let Some(value) = &current.value {
                    return (Some(value), params, false);
                }

                // No value here, but a trailing-slash variant may exist
                // below: through the wildcard child...
                if path == "/" && current.wild_child && current.kind != NodeKind::Root {
                    return (None, params, true);
                }
                if path == "/" && current.kind == NodeKind::Static {
                    return (None, params, true);
                }
                // ...or through a '/' edge.
                if let Some(i) = current.indices.iter().position(|&c| c == b'/') {
                    let child = &current.children[i];
                    let tsr = (child.path.len() == 1 && child.value.is_some())
                        || (child.kind == NodeKind::CatchAll
                            && child.children[0].value.is_some());
                    return (None, params, tsr);
                }
                return (None, params, false);
            }

            // The path diverges from this edge; adding a trailing slash
            // matches iff the edge is exactly `path` + '/' and terminal.
            let tsr = path == "/"
                || (prefix.len() == path.len() + 1
                    && prefix.as_bytes()[path.len()] == b'/'
                    && path == &prefix[..path.len()]
                    && current.value.is_some());
            return (None, params, tsr);
        }
    }

    /// Case-insensitive (ASCII) walk producing the canonical path for a
    /// miscased request, optionally fixing a trailing slash. Parameter
    /// values are passed through unfolded.
    pub(crate) fn find_case_insensitive(
        &self,
        path: &str,
        fix_trailing_slash: bool,
    ) -> Option<String> {
        let mut out = String::with_capacity(path.len() + 1);
        if self.walk_case_insensitive(path, fix_trailing_slash, &mut out) {
            Some(out)
        } else {
            None
        }
    }

    fn walk_case_insensitive(
        &self,
        path: &str,
        fix_trailing_slash: bool,
        out: &mut String,
    ) -> bool {
        let n = self.path.len();
        if path.len() < n || !path.as_bytes()[..n].eq_ignore_ascii_case(self.path.as_bytes()) {
            // The edge itself diverges; the one remaining fix is a missing
            // trailing slash on a terminal edge.
            if fix_trailing_slash
                && n == path.len() + 1
                && self.path.ends_with('/')
                && path
                    .as_bytes()
                    .eq_ignore_ascii_case(&self.path.as_bytes()[..path.len()])
                && self.value.is_some()
            {
                out.push_str(&self.path);
                return true;
            }
            return false;
        }

        out.push_str(&self.path);
        let rest = &path[n..];

        if rest.is_empty() {
            if self.value.is_some() {
                return true;
            }
            // Appending a slash can still reach a registered route.
            if fix_trailing_slash {
                if let Some(i) = self.indices.iter().position(|&c| c == b'/') {
                    let child = &self.children[i];
                    if (child.path.len() == 1 && child.value.is_some())
                        || (child.kind == NodeKind::CatchAll
                            && child.children[0].value.is_some())
                    {
                        out.push('/');
                        return true;
                    }
                }
            }
            return false;
        }

        if !self.wild_child {
            // Both the registered byte and its folded twin may exist as
            // separate edges, so every folding match is a branch point.
            let want = rest.as_bytes()[0].to_ascii_lowercase();
            for (i, &c) in self.indices.iter().enumerate() {
                if c.to_ascii_lowercase() == want {
                    let mark = out.len();
                    if self.children[i].walk_case_insensitive(rest, fix_trailing_slash, out) {
                        return true;
                    }
                    out.truncate(mark);
                }
            }
            // Nothing below matched; dropping a lone trailing slash lands
            // on this node's value.
            return fix_trailing_slash && rest == "/" && self.value.is_some();
        }

        let child = &self.children[self.children.len() - 1];
        match child.kind {
            NodeKind::Param => {
                let end = rest.bytes().position(|c| c == b'/').unwrap_or(rest.len());
                out.push_str(&rest[..end]);

                if end < rest.len() {
                    if !child.children.is_empty() {
                        return child.children[0].walk_case_insensitive(
                            &rest[end..],
                            fix_trailing_slash,
                            out,
                        );
                    }
                    return fix_trailing_slash && rest.len() == end + 1;
                }

                if child.value.is_some() {
                    return true;
                }
                if fix_trailing_slash && child.children.len() == 1 {
                    let grand = &child.children[0];
                    if grand.path == "/" && grand.value.is_some() {
                        out.push('/');
                        return true;
                    }
                }
                false
            }
            NodeKind::CatchAll => {
                out.push_str(rest);
                true
            }
            NodeKind::Static | NodeKind::Root => {
                unreachable!("wildcard child must be param or catch-all")
            }
        }
    }
}

/// Length of the shared byte prefix of `a` and `b`.
fn longest_common_prefix(a: &str, b: &str) -> usize {
    a.bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Find the next wildcard segment: returns the wildcard text (marker
/// included) and its byte offset.
fn find_wildcard(path: &str) -> Option<(&str, usize)> {
    for (start, c) in path.bytes().enumerate() {
        if c != b':' && c != b'*' {
            continue;
        }
        let end = path[start + 1..]
            .bytes()
            .position(|c| c == b'/')
            .map_or(path.len(), |i| start + 1 + i);
        return Some((&path[start..end], start));
    }
    None
}

/// Check pattern syntax without touching the tree, so a rejected pattern
/// can never leave a partial registration behind.
pub(crate) fn validate_pattern(pattern: &str) -> Result<(), RouteError> {
    if pattern.is_empty() {
        return Err(RouteError::EmptyPattern);
    }
    if !pattern.starts_with('/') {
        return Err(RouteError::PatternMustStartWithSlash {
            pattern: pattern.to_owned(),
        });
    }

    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let marker = bytes[i];
        if marker != b':' && marker != b'*' {
            i += 1;
            continue;
        }

        let start = i;
        let mut end = i + 1;
        while end < bytes.len() && bytes[end] != b'/' {
            if bytes[end] == b':' || bytes[end] == b'*' {
                return Err(RouteError::InvalidWildcardName {
                    pattern: pattern.to_owned(),
                    name: segment_at(pattern, start).to_owned(),
                });
            }
            end += 1;
        }

        let name = &pattern[start + 1..end];
        if name.is_empty() {
            return Err(RouteError::EmptyWildcardName {
                pattern: pattern.to_owned(),
            });
        }
        if name == MATCHED_ROUTE_PATH_PARAM {
            return Err(RouteError::ReservedParamName {
                pattern: pattern.to_owned(),
            });
        }
        if marker == b'*' {
            // A catch-all must be the terminal segment, preceded by '/'.
            // `start` is at least 1 here since patterns begin with '/'.
            if end != bytes.len() || bytes[start - 1] != b'/' {
                return Err(RouteError::CatchAllNotLast {
                    pattern: pattern.to_owned(),
                });
            }
        }

        i = end;
    }
    Ok(())
}

/// The whole path segment containing byte offset `at`.
fn segment_at(pattern: &str, at: usize) -> &str {
    let start = pattern[..at].rfind('/').map_or(0, |i| i + 1);
    let end = pattern[at..].find('/').map_or(pattern.len(), |i| at + i);
    &pattern[start..end]
}
