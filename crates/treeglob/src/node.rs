//! The compiled pattern tree.

use std::fmt::{Display, Formatter};

use crate::{
    matcher::{has_specials, GlobMatcher},
    GlobCompileError,
};

const RECURSIVE: &str = "**";

/// One compiled path component of a [`GlobTree`].
#[derive(Debug, Clone)]
pub struct GlobNode {
    pub(crate) pattern: String,
    pub(crate) matcher: Option<GlobMatcher>,
    pub(crate) children: Vec<GlobNode>,
    pub(crate) recursive_children: Vec<GlobNode>,
    pub(crate) include_dotfiles: bool,
    pub(crate) is_leaf: bool,
    pub(crate) has_specials: bool,
    pub(crate) always_match: bool,
}

impl GlobNode {
    fn root(include_dotfiles: bool) -> Self {
        Self {
            pattern: String::new(),
            matcher: None,
            children: Vec::new(),
            recursive_children: Vec::new(),
            include_dotfiles,
            is_leaf: false,
            has_specials: false,
            always_match: false,
        }
    }

    fn compile(token: &str, include_dotfiles: bool) -> Result<Self, GlobCompileError> {
        let has_specials = has_specials(token);
        let always_match = include_dotfiles && (token == "*" || token == RECURSIVE);
        let matcher = if always_match || !has_specials {
            None
        } else if token == RECURSIVE {
            Some(GlobMatcher::compile("*", include_dotfiles)?)
        } else {
            Some(GlobMatcher::compile(token, include_dotfiles)?)
        };
        Ok(Self {
            pattern: token.to_string(),
            matcher,
            children: Vec::new(),
            recursive_children: Vec::new(),
            include_dotfiles,
            is_leaf: false,
            has_specials,
            always_match,
        })
    }

    /// The fragment this node was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Nodes reached through an ordinary path component.
    pub fn children(&self) -> &[GlobNode] {
        &self.children
    }

    /// Nodes reached through a `**` component.
    pub fn recursive_children(&self) -> &[GlobNode] {
        &self.recursive_children
    }

    /// Returns true if a pattern ends at this node.
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Returns true if the fragment contains glob metacharacters.
    pub fn has_specials(&self) -> bool {
        self.has_specials
    }

    /// Returns true if this node matches every name.
    pub fn always_match(&self) -> bool {
        self.always_match
    }

    /// Returns true if this node matches the directory entry `name`.
    pub fn matches(&self, name: &str) -> bool {
        if self.always_match {
            return true;
        }
        match &self.matcher {
            Some(matcher) => matcher.matches(name),
            None => self.pattern == name,
        }
    }

    pub(crate) fn has_descendants(&self) -> bool {
        !self.children.is_empty() || !self.recursive_children.is_empty()
    }

    fn child_mut(&mut self, compiled: GlobNode) -> &mut GlobNode {
        let siblings = if compiled.pattern == RECURSIVE {
            &mut self.recursive_children
        } else {
            &mut self.children
        };
        let index = match siblings.iter().position(|node| node.pattern == compiled.pattern) {
            Some(index) => index,
            None => {
                siblings.push(compiled);
                siblings.len() - 1
            }
        };
        &mut siblings[index]
    }

    fn fmt_indented(&self, f: &mut Formatter<'_>, depth: usize) -> std::fmt::Result {
        for node in self.children.iter().chain(&self.recursive_children) {
            write!(f, "{:indent$}{}", "", node.pattern, indent = depth * 2)?;
            if node.is_leaf {
                f.write_str(" [leaf]")?;
            }
            if node.always_match {
                f.write_str(" [always]")?;
            } else if !node.has_specials {
                f.write_str(" [literal]")?;
            }
            writeln!(f)?;
            node.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

/// A set of glob patterns compiled into a prefix tree of path components.
///
/// Patterns sharing a leading component share the node for it, so evaluating
/// many patterns walks every directory at most once per distinct prefix.
///
/// ```rust
/// use treeglob::GlobTree;
///
/// let mut tree = GlobTree::new(false);
/// tree.parse("*.txt").unwrap();
/// tree.parse("src/**/*.rs").unwrap();
/// assert_eq!(tree.root().children().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct GlobTree {
    root: GlobNode,
}

impl GlobTree {
    /// Creates an empty tree. `include_dotfiles` applies to every pattern.
    pub fn new(include_dotfiles: bool) -> Self {
        Self {
            root: GlobNode::root(include_dotfiles),
        }
    }

    /// Compiles a tree from a list of patterns.
    pub fn from_patterns<I, S>(patterns: I, include_dotfiles: bool) -> Result<Self, GlobCompileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new(include_dotfiles);
        for pattern in patterns {
            tree.parse(pattern.as_ref())?;
        }
        Ok(tree)
    }

    /// Whether wildcards match names with a leading `.`.
    pub fn include_dotfiles(&self) -> bool {
        self.root.include_dotfiles
    }

    /// The root sentinel. Its children are matched against the entries of
    /// the evaluation root.
    pub fn root(&self) -> &GlobNode {
        &self.root
    }

    /// Returns true if no pattern has been added.
    pub fn is_empty(&self) -> bool {
        !self.root.has_descendants()
    }

    /// Adds a pattern to the tree.
    ///
    /// On error the tree is left unchanged.
    pub fn parse(&mut self, pattern: &str) -> Result<(), GlobCompileError> {
        let include_dotfiles = self.root.include_dotfiles;
        let compiled = tokenize(pattern)?
            .into_iter()
            .map(|token| GlobNode::compile(token, include_dotfiles))
            .collect::<Result<Vec<_>, _>>()?;

        let last = compiled.len() - 1;
        let mut node = &mut self.root;
        for (index, token) in compiled.into_iter().enumerate() {
            node = node.child_mut(token);
            if index == last {
                node.is_leaf = true;
            }
        }
        Ok(())
    }

    /// Renders the tree for diagnostics. The format is not stable.
    pub fn debug_dump(&self) -> String {
        self.to_string()
    }
}

impl Display for GlobTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.root.fmt_indented(f, 0)
    }
}

/// Splits a pattern into its components at unescaped `/`.
fn tokenize(pattern: &str) -> Result<Vec<&str>, GlobCompileError> {
    if pattern.is_empty() {
        return Err(GlobCompileError::EmptyPattern);
    }

    let mut tokens = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (index, c) in pattern.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '/' => {
                tokens.push(&pattern[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    // A single trailing separator is ignored.
    if start < pattern.len() || tokens.is_empty() {
        tokens.push(&pattern[start..]);
    }

    if let Some(invalid) = tokens
        .iter()
        .find(|token| token.is_empty() || **token == "." || **token == "..")
    {
        return Err(GlobCompileError::InvalidComponent {
            pattern: pattern.to_string(),
            component: invalid.to_string(),
        });
    }
    Ok(tokens)
}
