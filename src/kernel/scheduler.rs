//! Preemptive round-robin scheduler.
//!
//! Unlike a cooperative design, a task never calls into the scheduler
//! directly to give up the core: the periodic timer IRQ is the only path
//! that runs [`on_irq`], which decides whether to keep running the
//! interrupted task or splice in the next Ready one. The one exception is
//! task exit, which intentionally triggers its own trap (an undefined
//! instruction) so that it, too, goes through the same trapframe machinery
//! rather than needing a second, cooperative switch path.

use crate::architecture::config::{MAX_TASKS, STACK_SIZE, TICK_INTERVAL_MS};
use crate::architecture::spinlock::SpinLock;
use crate::kernel::Mutex;
use core::sync::atomic::{AtomicU32, Ordering};

/// The saved register image an interrupted task leaves on its own stack.
///
/// Field order must match the store/load order in
/// [`crate::architecture::vectors`] exactly.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Trapframe {
    pub gpr: [u64; 31],
    pub elr_el1: u64,
    pub spsr_el1: u64,
    _alignment_pad: u64,
}

/// `SPSR_EL1.M` value for EL1h (SP_EL1, the only mode this kernel runs in).
const SPSR_EL1H: u64 = 0b0101;
/// IRQs unmasked, FIQ/SError/debug masked, in the packed DAIF field layout
/// SPSR uses (bits 6-9: D, A, I, F).
const SPSR_IRQ_UNMASKED: u64 = 0b1101 << 6;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    Ready,
    Running,
    Blocked,
    Dead,
}

#[repr(align(16))]
struct Stack([u8; STACK_SIZE]);

struct Task {
    state: State,
    id: u32,
    name: [u8; 16],
    sp: u64,
    stack: Stack,
    wake_at_tick: u64,
    next: Option<usize>,
}

impl Task {
    const fn empty() -> Self {
        Self {
            state: State::Dead,
            id: 0,
            name: [0; 16],
            sp: 0,
            stack: Stack([0; STACK_SIZE]),
            wake_at_tick: 0,
            next: None,
        }
    }

    fn name_str(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(16);
        core::str::from_utf8(&self.name[..len]).unwrap_or("?")
    }
}

/// The reserved slot for the boot context (the interactive shell).
pub const SHELL_TASK_SLOT: usize = 0;

struct SchedulerState {
    tasks: [Task; MAX_TASKS],
    ready_head: Option<usize>,
    current: Option<usize>,
    next_id: u32,
    tick: u64,
    enabled: bool,
}

impl SchedulerState {
    fn enqueue(&mut self, slot: usize) {
        self.tasks[slot].next = None;
        match self.ready_head {
            None => self.ready_head = Some(slot),
            Some(mut cursor) => {
                while let Some(next) = self.tasks[cursor].next {
                    cursor = next;
                }
                self.tasks[cursor].next = Some(slot);
            }
        }
    }

    fn dequeue_ready(&mut self) -> Option<usize> {
        let tick = self.tick;
        let mut cursor = self.ready_head;
        let mut prev: Option<usize> = None;

        while let Some(slot) = cursor {
            if self.tasks[slot].state == State::Blocked && self.tasks[slot].wake_at_tick <= tick {
                self.tasks[slot].state = State::Ready;
            }

            if self.tasks[slot].state == State::Ready {
                let next = self.tasks[slot].next;
                match prev {
                    Some(p) => self.tasks[p].next = next,
                    None => self.ready_head = next,
                }
                self.tasks[slot].next = None;
                return Some(slot);
            }

            prev = Some(slot);
            cursor = self.tasks[slot].next;
        }
        None
    }
}

static STATE: SpinLock<SchedulerState> = SpinLock::new(SchedulerState {
    tasks: [
        Task::empty(), Task::empty(), Task::empty(), Task::empty(),
        Task::empty(), Task::empty(), Task::empty(), Task::empty(),
        Task::empty(), Task::empty(), Task::empty(), Task::empty(),
        Task::empty(), Task::empty(), Task::empty(), Task::empty(),
    ],
    ready_head: None,
    current: None,
    next_id: 1,
    tick: 0,
    enabled: false,
});

static TASKS_RUN: AtomicU32 = AtomicU32::new(0);

/// Marks the reserved shell slot as the initially running task, adopting
/// whatever trapframe the boot context eventually takes its first trap
/// from. Must run once, with IRQs still masked.
pub fn init() {
    crate::call_once!();
    STATE.lock(|state| {
        state.tasks[SHELL_TASK_SLOT].state = State::Running;
        state.tasks[SHELL_TASK_SLOT].id = 0;
        state.tasks[SHELL_TASK_SLOT].name[..5].copy_from_slice(b"shell");
        state.current = Some(SHELL_TASK_SLOT);
        state.enabled = true;
    });
}

/// Builds a new Ready task around `entry`, with a synthetic trapframe near
/// the top of its dedicated stack, and enqueues it.
///
/// Returns `None` if the task pool is exhausted.
pub fn spawn(name: &str, entry: extern "C" fn() -> !) -> Option<u32> {
    STATE.lock(|state| {
        let slot = (0..MAX_TASKS).find(|&i| state.tasks[i].state == State::Dead)?;

        let id = state.next_id;
        state.next_id += 1;

        {
            let task = &mut state.tasks[slot];
            task.name = [0; 16];
            let copy_len = name.len().min(15);
            task.name[..copy_len].copy_from_slice(&name.as_bytes()[..copy_len]);
            task.id = id;
            task.state = State::Ready;
            task.wake_at_tick = 0;
        }

        let stack_top = core::ptr::addr_of_mut!(state.tasks[slot].stack.0)
            as *mut u8 as u64
            + STACK_SIZE as u64;
        let trapframe_addr = (stack_top - core::mem::size_of::<Trapframe>() as u64) & !0xF;
        let trapframe = trapframe_addr as *mut Trapframe;

        unsafe {
            core::ptr::write_bytes(trapframe, 0, 1);
            (*trapframe).gpr[30] = exit_trampoline as *const () as u64;
            (*trapframe).elr_el1 = entry as *const () as u64;
            (*trapframe).spsr_el1 = SPSR_EL1H | SPSR_IRQ_UNMASKED;
        }

        state.tasks[slot].sp = trapframe_addr;
        state.enqueue(slot);
        Some(id)
    })
}

/// Lands here (via `x30`) if a task's entry point ever returns instead of
/// exiting explicitly.
extern "C" fn exit_trampoline() -> ! {
    exit();
}

/// Marks the current task Dead and never returns; the next timer tick
/// splices a different task in.
pub fn exit() -> ! {
    STATE.lock(|state| {
        if let Some(slot) = state.current {
            state.tasks[slot].state = State::Dead;
        }
    });
    loop {
        aarch64_cpu::asm::wfi();
    }
}

/// Rejects id 0 (the shell) and the id of the currently running task.
/// Otherwise unlinks the task from the ready queue if present and marks it
/// Dead, freeing its slot for reuse.
pub fn kill(id: u32) -> Result<(), &'static str> {
    if id == 0 {
        return Err("cannot kill shell");
    }
    STATE.lock(|state| {
        let slot = (0..MAX_TASKS)
            .find(|&i| state.tasks[i].id == id && state.tasks[i].state != State::Dead)
            .ok_or("no such task")?;

        if state.current == Some(slot) {
            return Err("cannot kill the running task");
        }

        if state.ready_head == Some(slot) {
            state.ready_head = state.tasks[slot].next;
        } else if let Some(mut cursor) = state.ready_head {
            while let Some(next) = state.tasks[cursor].next {
                if next == slot {
                    state.tasks[cursor].next = state.tasks[slot].next;
                    break;
                }
                cursor = next;
            }
        }

        state.tasks[slot].state = State::Dead;
        state.tasks[slot].next = None;
        Ok(())
    })
}

/// Blocks the current task for at least `ticks` scheduler ticks.
pub fn sleep_ticks(ticks: u64) {
    STATE.lock(|state| {
        if let Some(slot) = state.current {
            state.tasks[slot].wake_at_tick = state.tick + ticks;
            state.tasks[slot].state = State::Blocked;
        }
    });
}

/// Invoked from the IRQ vector with the interrupted task's saved trapframe
/// address. Confirms the timer is the interrupt source, acknowledges it
/// with the GIC, re-arms it, and performs one round of round-robin
/// scheduling if the scheduler is enabled.
///
/// Returns the stack pointer that should be resumed, which is either the
/// interrupted task's own frame (scheduler disabled, or nothing else is
/// Ready) or the frame of whichever task was picked next.
pub fn on_irq(interrupted_sp: *mut Trapframe) -> *mut Trapframe {
    use crate::architecture::{gic, machine, timer};
    use crate::kernel::core_state;

    let core = machine::core_id();
    let acked_id = gic::get_interrupt();

    if !timer::is_pending() {
        gic::end_interrupt(acked_id);
        return interrupted_sp;
    }

    let ticks = (u64::from(timer::frequency().get()) / 1000) * u64::from(TICK_INTERVAL_MS);
    timer::rearm(ticks);
    gic::end_interrupt(acked_id);
    core_state::record_tick(core);

    // Secondary cores tick but never pull from the shared run queue: task
    // migration across cores is not implemented, only permitted by the
    // lock-gated queue design.
    if core != 0 {
        return interrupted_sp;
    }

    STATE.lock(|state| {
        state.tick += 1;

        if !state.enabled {
            return interrupted_sp;
        }

        let prev = state.current.expect("current task must be set once enabled");
        state.tasks[prev].sp = interrupted_sp as u64;

        if state.tasks[prev].state == State::Running {
            state.tasks[prev].state = State::Ready;
            state.enqueue(prev);
        }

        match state.dequeue_ready() {
            Some(next) => {
                state.tasks[next].state = State::Running;
                state.current = Some(next);
                TASKS_RUN.fetch_add(1, Ordering::Relaxed);
                state.tasks[next].sp as *mut Trapframe
            }
            None => {
                // Nothing else is Ready; keep running the interrupted task.
                state.tasks[prev].state = State::Running;
                state.current = Some(prev);
                interrupted_sp
            }
        }
    })
}

/// Number of scheduler ticks observed so far on this core's timeline.
pub fn tick_count() -> u64 {
    STATE.lock(|state| state.tick)
}

/// Total number of task hand-offs the scheduler has performed.
pub fn tasks_run() -> u32 {
    TASKS_RUN.load(Ordering::Relaxed)
}

/// Prints a `ps`-style listing of every non-Dead task.
pub fn print_tasks() {
    STATE.lock(|state| {
        crate::println!("ID   STATE     NAME");
        for task in state.tasks.iter() {
            if task.state == State::Dead {
                continue;
            }
            crate::println!("{:<4} {:<9?} {}", task.id, task.state, task.name_str());
        }
    });
}
