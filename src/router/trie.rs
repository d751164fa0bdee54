//! Radix trie used for route resolution.
//!
//! Every method tree owns one [`PathTrie`]. Literal text is stored compressed:
//! a node's `prefix` holds the longest run shared by all routes below it, so
//! `/api/v1/users` and `/api/v1/orders` share a single `/api/v1/` node.
//!
//! ## Node layout
//!
//! Each node has three kinds of children, tried in a fixed order:
//!
//! 1. **Static** children, keyed by the first character of their prefix
//! 2. At most one **param** child (`:name`), which captures one segment
//! 3. At most one **wildcard** child (`*name`), which captures the rest
//!
//! Capture *names* are not stored in the trie. A node only knows that a
//! capture happens there; the names are bound from the matched [`Route`], so
//! `/users/:id/comments` and `/users/:user_id/posts` share the param node and
//! still bind their own names.
//!
//! ## Resolution
//!
//! Lookup is a depth-first walk with backtracking, driven by an explicit
//! stack of frames instead of recursion, so deep request paths cannot grow the
//! call stack. When a static branch dead-ends, the walk falls back to the
//! param and wildcard branches of the node where it took that branch. With
//! `/users/new` and `/users/:id` registered, `/users/newbie` first follows the
//! `new` literal, fails, and then matches `:id`.
//!
//! Every frame either consumes path bytes or is terminal, so the walk always
//! finishes.

use smallvec::SmallVec;
use std::sync::Arc;

use super::route::{parse_pattern, Piece, Route};
use crate::context::MAX_INLINE_PARAMS;
use crate::error::{Result, RouterError};

/// Captured values, borrowed from the resolved path.
pub type Captures<'p> = SmallVec<[&'p str; MAX_INLINE_PARAMS]>;

#[derive(Debug, Default)]
struct Node {
    prefix: String,
    statics: Vec<Node>,
    param: Option<Box<Node>>,
    wildcard: Option<Box<Node>>,
    route: Option<Arc<Route>>,
}

impl Node {
    fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Self::default()
        }
    }

    fn insert(&mut self, pieces: &[Piece<'_>]) -> &mut Node {
        let Some((piece, rest)) = pieces.split_first() else {
            return self;
        };
        let next = match *piece {
            Piece::Static(text) => self.descend_static(text),
            Piece::Param(_) => self.param.get_or_insert_with(Box::default).as_mut(),
            Piece::Wildcard(_) => self.wildcard.get_or_insert_with(Box::default).as_mut(),
        };
        next.insert(rest)
    }

    /// Walk (and split where needed) the static children so that `text` ends
    /// exactly on a node boundary.
    fn descend_static(&mut self, text: &str) -> &mut Node {
        let Some(first) = text.chars().next() else {
            return self;
        };
        let existing = self
            .statics
            .iter()
            .position(|child| child.prefix.starts_with(first));

        match existing {
            Some(idx) => {
                let child = &mut self.statics[idx];
                let common = common_prefix_len(&child.prefix, text);
                if common < child.prefix.len() {
                    child.split_at(common);
                }
                child.descend_static(&text[common..])
            }
            None => {
                let idx = self.statics.len();
                self.statics.push(Node::with_prefix(text));
                &mut self.statics[idx]
            }
        }
    }

    /// Keep `prefix[..at]` here and move everything else into a new child.
    fn split_at(&mut self, at: usize) {
        let tail = Node {
            prefix: self.prefix[at..].to_string(),
            statics: std::mem::take(&mut self.statics),
            param: self.param.take(),
            wildcard: self.wildcard.take(),
            route: self.route.take(),
        };
        self.prefix.truncate(at);
        self.statics.push(tail);
    }
}

/// Length in bytes of the longest common prefix, on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map_or_else(|| a.len().min(b.len()), |((idx, _), _)| idx)
}

#[derive(Clone, Copy)]
enum Step {
    /// Match the node's children against the rest of the path.
    Enter,
    /// Wildcard node: the path is fully consumed.
    Terminal,
}

#[derive(Clone, Copy)]
struct Frame<'t> {
    node: &'t Node,
    pos: usize,
    /// Number of captures that were live when this frame was pushed.
    depth: usize,
    capture: Option<(usize, usize)>,
    step: Step,
}

/// Successful resolution.
#[derive(Debug)]
pub struct Resolved<'t, 'p> {
    /// Route stored at the matched node.
    pub route: &'t Arc<Route>,
    /// Captured values in pattern order.
    pub values: Captures<'p>,
}

/// Per-method route trie.
#[derive(Debug, Default)]
pub struct PathTrie {
    root: Node,
    routes: Vec<Arc<Route>>,
}

impl PathTrie {
    /// Create an empty trie.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `route` under its match key.
    ///
    /// # Errors
    ///
    /// - [`RouterError::InvalidPattern`] for a malformed pattern
    /// - [`RouterError::RouteConflict`] when a route already ends on the same
    ///   node; the existing route is kept
    pub fn insert(&mut self, route: Arc<Route>) -> Result<()> {
        let pieces = parse_pattern(route.pattern(), route.match_key())?;
        let node = self.root.insert(&pieces);
        if node.route.is_some() {
            return Err(RouterError::RouteConflict {
                method: route.method().to_string(),
                pattern: route.match_key().to_string(),
            });
        }
        node.route = Some(Arc::clone(&route));
        self.routes.push(route);
        Ok(())
    }

    /// Find the route matching `path`.
    #[must_use]
    pub fn resolve<'t, 'p>(&'t self, path: &'p str) -> Option<Resolved<'t, 'p>> {
        let mut captures: SmallVec<[(usize, usize); MAX_INLINE_PARAMS]> = SmallVec::new();
        let mut stack: SmallVec<[Frame<'t>; 16]> = SmallVec::new();
        stack.push(Frame {
            node: &self.root,
            pos: 0,
            depth: 0,
            capture: None,
            step: Step::Enter,
        });

        while let Some(frame) = stack.pop() {
            captures.truncate(frame.depth);
            if let Some(span) = frame.capture {
                captures.push(span);
            }
            let node = frame.node;
            let rest = &path[frame.pos..];

            if rest.is_empty() || matches!(frame.step, Step::Terminal) {
                if let Some(route) = &node.route {
                    let values = captures.iter().map(|&(start, end)| &path[start..end]).collect();
                    return Some(Resolved { route, values });
                }
                if matches!(frame.step, Step::Terminal) {
                    continue;
                }
            }

            // Pushed lowest priority first so statics pop first.
            let depth = captures.len();
            if let Some(wildcard) = node.wildcard.as_deref() {
                stack.push(Frame {
                    node: wildcard,
                    pos: path.len(),
                    depth,
                    capture: Some((frame.pos, path.len())),
                    step: Step::Terminal,
                });
            }
            if let Some(param) = node.param.as_deref() {
                let end = rest.find('/').map_or(path.len(), |n| frame.pos + n);
                if end > frame.pos {
                    stack.push(Frame {
                        node: param,
                        pos: end,
                        depth,
                        capture: Some((frame.pos, end)),
                        step: Step::Enter,
                    });
                }
            }
            for child in node.statics.iter().rev() {
                if rest.starts_with(child.prefix.as_str()) {
                    stack.push(Frame {
                        node: child,
                        pos: frame.pos + child.prefix.len(),
                        depth,
                        capture: None,
                        step: Step::Enter,
                    });
                }
            }
        }
        None
    }

    /// Routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Number of routes stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// `true` when no route has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerChain;
    use http::Method;

    fn trie(patterns: &[&str]) -> PathTrie {
        let mut trie = PathTrie::new();
        for pattern in patterns {
            let route = Route::new(Method::GET, None, pattern, HandlerChain::new()).unwrap();
            trie.insert(Arc::new(route)).unwrap();
        }
        trie
    }

    fn resolve<'p>(trie: &PathTrie, path: &'p str) -> Option<(String, Vec<&'p str>)> {
        trie.resolve(path)
            .map(|m| (m.route.pattern().to_string(), m.values.to_vec()))
    }

    #[test]
    fn test_static_routes() {
        let trie = trie(&["/", "/users", "/upload", "/users/all"]);
        assert_eq!(resolve(&trie, "/"), Some(("/".into(), vec![])));
        assert_eq!(resolve(&trie, "/users"), Some(("/users".into(), vec![])));
        assert_eq!(resolve(&trie, "/upload"), Some(("/upload".into(), vec![])));
        assert_eq!(resolve(&trie, "/users/all"), Some(("/users/all".into(), vec![])));
        assert_eq!(resolve(&trie, "/u"), None);
        assert_eq!(resolve(&trie, "/users/"), None);
    }

    #[test]
    fn test_param_route() {
        let trie = trie(&["/users/:id"]);
        assert_eq!(resolve(&trie, "/users/42"), Some(("/users/:id".into(), vec!["42"])));
        assert_eq!(resolve(&trie, "/users/42/extra"), None);
        assert_eq!(resolve(&trie, "/users/"), None);
    }

    #[test]
    fn test_wildcard_route() {
        let trie = trie(&["/files/*path"]);
        assert_eq!(
            resolve(&trie, "/files/a/b/c"),
            Some(("/files/*path".into(), vec!["a/b/c"]))
        );
        assert_eq!(resolve(&trie, "/files/"), Some(("/files/*path".into(), vec![""])));
        assert_eq!(resolve(&trie, "/files"), None);
    }

    #[test]
    fn test_static_beats_param_and_backtracks() {
        let trie = trie(&["/users/new", "/users/:id"]);
        assert_eq!(resolve(&trie, "/users/new"), Some(("/users/new".into(), vec![])));
        assert_eq!(resolve(&trie, "/users/99"), Some(("/users/:id".into(), vec!["99"])));
        assert_eq!(
            resolve(&trie, "/users/newbie"),
            Some(("/users/:id".into(), vec!["newbie"]))
        );
    }

    #[test]
    fn test_deep_backtracking_restores_captures() {
        let trie = trie(&["/:a/x/:b", "/:a/:c/y"]);
        assert_eq!(
            resolve(&trie, "/one/x/y"),
            Some(("/:a/x/:b".into(), vec!["one", "y"]))
        );
        assert_eq!(
            resolve(&trie, "/one/x2/y"),
            Some(("/:a/:c/y".into(), vec!["one", "x2"]))
        );
    }

    #[test]
    fn test_param_beats_wildcard() {
        let trie = trie(&["/assets/:name", "/assets/*rest"]);
        assert_eq!(
            resolve(&trie, "/assets/app.js"),
            Some(("/assets/:name".into(), vec!["app.js"]))
        );
        assert_eq!(
            resolve(&trie, "/assets/css/app.css"),
            Some(("/assets/*rest".into(), vec!["css/app.css"]))
        );
    }

    #[test]
    fn test_sibling_capture_names() {
        let trie = trie(&["/users/:id/comments", "/users/:user_id/posts"]);
        let m = trie.resolve("/users/7/posts").unwrap();
        assert_eq!(m.route.param_names()[0].as_ref(), "user_id");
        assert_eq!(m.values.as_slice(), ["7"]);
        let m = trie.resolve("/users/7/comments").unwrap();
        assert_eq!(m.route.param_names()[0].as_ref(), "id");
    }

    #[test]
    fn test_conflict_keeps_first() {
        let mut trie = trie(&["/users/:id"]);
        let dup = Route::new(Method::GET, None, "/users/:name", HandlerChain::new()).unwrap();
        let err = trie.insert(Arc::new(dup)).unwrap_err();
        assert!(matches!(err, RouterError::RouteConflict { .. }));
        assert_eq!(trie.len(), 1);
        let m = trie.resolve("/users/1").unwrap();
        assert_eq!(m.route.param_names()[0].as_ref(), "id");
    }

    #[test]
    fn test_multibyte_prefixes_split_on_char_boundary() {
        let trie = trie(&["/café", "/cafè", "/ça"]);
        assert_eq!(resolve(&trie, "/café"), Some(("/café".into(), vec![])));
        assert_eq!(resolve(&trie, "/cafè"), Some(("/cafè".into(), vec![])));
        assert_eq!(resolve(&trie, "/ça"), Some(("/ça".into(), vec![])));
        assert_eq!(resolve(&trie, "/caf"), None);
    }

    #[test]
    fn test_common_prefix_len() {
        assert_eq!(common_prefix_len("/users", "/upload"), 2);
        assert_eq!(common_prefix_len("/a", "/a/b"), 2);
        assert_eq!(common_prefix_len("é", "è"), 0);
    }

    #[test]
    fn test_many_params() {
        let trie = trie(&["/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i"]);
        let m = trie.resolve("/complex/1/2/3/4/5/6/7/8/9").unwrap();
        assert_eq!(m.values.len(), 9);
        assert_eq!(m.values[8], "9");
    }
}
