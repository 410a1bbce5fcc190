use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, bounded};
use karst_world::{GenCtx, World};

/// Pre-filled freelist of worldgen contexts, one slot per worker. Building
/// a `GenCtx` re-seeds every noise field, so generate jobs check one out
/// and return it on drop instead of rebuilding.
pub struct GenCtxPool {
    slots_tx: Sender<GenCtx>,
    slots_rx: Receiver<GenCtx>,
}

impl GenCtxPool {
    pub fn new(world: &World, workers: usize) -> Arc<Self> {
        let count = workers.max(1);
        let (slots_tx, slots_rx) = bounded(count);
        for _ in 0..count {
            let _ = slots_tx.send(world.make_gen_ctx());
        }
        Arc::new(Self { slots_tx, slots_rx })
    }

    /// Blocks until a context is free. With one slot per worker and at most
    /// one checkout per job this never waits in practice.
    pub fn acquire(&self) -> PooledGenCtx<'_> {
        // The pool owns a sender, so the channel cannot disconnect.
        let mut ctx = self.slots_rx.recv().expect("context pool disconnected");
        ctx.reset();
        PooledGenCtx {
            ctx: Some(ctx),
            pool: self,
        }
    }
}

pub struct PooledGenCtx<'pool> {
    ctx: Option<GenCtx>,
    pool: &'pool GenCtxPool,
}

impl Deref for PooledGenCtx<'_> {
    type Target = GenCtx;

    fn deref(&self) -> &GenCtx {
        self.ctx.as_ref().expect("context checked back in")
    }
}

impl DerefMut for PooledGenCtx<'_> {
    fn deref_mut(&mut self) -> &mut GenCtx {
        self.ctx.as_mut().expect("context checked back in")
    }
}

impl Drop for PooledGenCtx<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            let _ = self.pool.slots_tx.send(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_recycle_through_the_pool() {
        let world = World::with_default_params(9);
        let pool = GenCtxPool::new(&world, 2);
        let a = pool.acquire();
        let _b = pool.acquire();
        // Returning a checkout frees its slot; a third acquire would block
        // forever if release were broken.
        drop(a);
        let _c = pool.acquire();
    }
}
