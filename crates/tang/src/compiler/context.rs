//! See the module doc in `compiler/mod.rs`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(usize);

/// Per-compile-unit (one per `Program`, shared across its function bodies) label
/// table and loop/return context stack.
#[derive(Debug, Default)]
pub struct CompilerContext {
    /// Jump-site offsets recorded against each label, before the label is resolved.
    labels_from: Vec<Vec<usize>>,
    /// The resolved target offset for each label, once known.
    labels: Vec<Option<usize>>,
    /// Stack of `(break_label, continue_label)` for nested loops, so `Break`/`Continue`
    /// always jump to the innermost enclosing loop's labels.
    loop_labels: Vec<(LabelId, LabelId)>,
    /// The current function body's shared return label, if compiling inside one.
    return_label: Option<LabelId>,
    /// Running count of max stack depth seen, tracked so the native backend can size
    /// its frame and keep the System V 16-byte alignment invariant at call sites.
    stack_depth: i64,
    max_stack_depth: i64,
}

impl CompilerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new, as-yet-unresolved label.
    pub fn new_label(&mut self) -> LabelId {
        let id = LabelId(self.labels.len());
        self.labels.push(None);
        self.labels_from.push(Vec::new());
        id
    }

    /// Records that the jump instruction at `offset` targets `label`. If `label` is
    /// already resolved, returns its offset immediately so the caller can emit the
    /// final displacement directly instead of a placeholder.
    pub fn add_label_jump(&mut self, label: LabelId, offset: usize) -> Option<usize> {
        if let Some(target) = self.labels[label.0] {
            return Some(target);
        }
        self.labels_from[label.0].push(offset);
        None
    }

    /// Resolves `label` to `offset`, returning every previously recorded jump site that
    /// now needs patching.
    pub fn set_label(&mut self, label: LabelId, offset: usize) -> Vec<usize> {
        self.labels[label.0] = Some(offset);
        std::mem::take(&mut self.labels_from[label.0])
    }

    pub fn label_offset(&self, label: LabelId) -> Option<usize> {
        self.labels[label.0]
    }

    pub fn push_loop(&mut self, break_label: LabelId, continue_label: LabelId) {
        self.loop_labels.push((break_label, continue_label));
    }

    pub fn pop_loop(&mut self) {
        self.loop_labels.pop();
    }

    pub fn current_break_label(&self) -> Option<LabelId> {
        self.loop_labels.last().map(|(b, _)| *b)
    }

    pub fn current_continue_label(&self) -> Option<LabelId> {
        self.loop_labels.last().map(|(_, c)| *c)
    }

    pub fn enter_function(&mut self, return_label: LabelId) -> Option<LabelId> {
        self.stack_depth = 0;
        self.max_stack_depth = 0;
        self.return_label.replace(return_label)
    }

    pub fn exit_function(&mut self, previous: Option<LabelId>) {
        self.return_label = previous;
    }

    pub fn current_return_label(&self) -> Option<LabelId> {
        self.return_label
    }

    /// Call before emitting a push: keeps `max_stack_depth` current so the JIT can
    /// reserve enough stack slots and keep the frame 16-byte aligned (§4.7).
    pub fn note_push(&mut self) {
        self.stack_depth += 1;
        self.max_stack_depth = self.max_stack_depth.max(self.stack_depth);
    }

    pub fn note_pop(&mut self, count: i64) {
        self.stack_depth -= count;
    }

    pub fn max_stack_depth(&self) -> i64 {
        self.max_stack_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_jump_resolves_after_set_label() {
        let mut ctx = CompilerContext::new();
        let label = ctx.new_label();
        assert_eq!(ctx.add_label_jump(label, 10), None);
        let sites = ctx.set_label(label, 42);
        assert_eq!(sites, vec![10]);
        assert_eq!(ctx.label_offset(label), Some(42));
    }

    #[test]
    fn backward_jump_resolves_immediately() {
        let mut ctx = CompilerContext::new();
        let label = ctx.new_label();
        ctx.set_label(label, 5);
        assert_eq!(ctx.add_label_jump(label, 20), Some(5));
    }

    #[test]
    fn loop_label_stack_nests() {
        let mut ctx = CompilerContext::new();
        let outer = (ctx.new_label(), ctx.new_label());
        let inner = (ctx.new_label(), ctx.new_label());
        ctx.push_loop(outer.0, outer.1);
        ctx.push_loop(inner.0, inner.1);
        assert_eq!(ctx.current_break_label(), Some(inner.0));
        ctx.pop_loop();
        assert_eq!(ctx.current_break_label(), Some(outer.0));
    }
}
