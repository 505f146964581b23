//! Lexical scope stack for function bodies.

use rustc_hash::FxHashMap;

use super::table::DeclId;

/// Nested block scopes of the function currently being resolved.
///
/// Package and file scopes live outside the stack.
#[derive(Debug, Default)]
pub struct LocalScopes {
    blocks: Vec<FxHashMap<String, DeclId>>,
}

impl LocalScopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new block.
    pub fn push(&mut self) {
        self.blocks.push(FxHashMap::default());
    }

    /// Leave the innermost block, forgetting its declarations.
    pub fn pop(&mut self) {
        self.blocks.pop();
    }

    /// Whether no function is being resolved.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Declare `name` in the innermost block.
    ///
    /// Returns the previous declaration of the same name in that block, if
    /// any; the new declaration does not replace it.
    pub fn declare(&mut self, name: &str, id: DeclId) -> Option<DeclId> {
        let block = self.blocks.last_mut()?;
        match block.get(name) {
            Some(previous) => Some(*previous),
            None => {
                block.insert(name.to_string(), id);
                None
            }
        }
    }

    /// Look `name` up in the innermost block only.
    pub fn lookup_current(&self, name: &str) -> Option<DeclId> {
        self.blocks.last()?.get(name).copied()
    }

    /// Look `name` up from the innermost block outwards.
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.blocks
            .iter()
            .rev()
            .find_map(|block| block.get(name).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_blocks_shadow_outer() {
        let mut scopes = LocalScopes::new();
        scopes.push();
        assert_eq!(scopes.declare("x", DeclId(0)), None);
        scopes.push();
        assert_eq!(scopes.declare("x", DeclId(1)), None);
        assert_eq!(scopes.lookup("x"), Some(DeclId(1)));
        scopes.pop();
        assert_eq!(scopes.lookup("x"), Some(DeclId(0)));
    }

    #[test]
    fn same_block_redeclaration_keeps_first() {
        let mut scopes = LocalScopes::new();
        scopes.push();
        scopes.declare("x", DeclId(0));
        assert_eq!(scopes.declare("x", DeclId(1)), Some(DeclId(0)));
        assert_eq!(scopes.lookup_current("x"), Some(DeclId(0)));
    }

    #[test]
    fn declare_without_block_is_ignored() {
        let mut scopes = LocalScopes::new();
        assert!(scopes.is_empty());
        assert_eq!(scopes.declare("x", DeclId(0)), None);
        assert_eq!(scopes.lookup("x"), None);
    }
}
