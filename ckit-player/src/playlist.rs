//! Playlist: a strictly serial FIFO of groups
//!
//! `begin` drains the queue front to back. Each group runs to completion
//! (natural or skipped) before the next is popped; appends made while
//! draining are picked up because the queue is re-checked after every
//! group.
//!
//! Advancing is a loop, not recursion: a group that completes inside its
//! own `run` (empty, or every member pre-skipped) marks itself done and the
//! loop already on the stack moves on.

use crate::error::{Error, Result};
use crate::group::{Group, GroupHandle, GroupPhase};
use crate::host::HostLoop;
use ckit_common::events::{CutsceneEvent, EventBus};
use ckit_common::time::now;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Playlist lifecycle: `Empty → Draining → Drained`
///
/// `Empty` and `Drained` look the same from outside (nothing active);
/// `Drained` is only reached after a `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistPhase {
    Empty,
    Draining,
    Drained,
}

/// Handle to a serial queue of groups
///
/// Clones share the same queue and event bus.
#[derive(Clone)]
pub struct Playlist {
    shared: Rc<RefCell<PlaylistState>>,
    host: HostLoop,
}

struct PlaylistState {
    id: Uuid,
    queue: VecDeque<Group>,
    /// Non-owning view of the running group; routes skip only
    active: Option<GroupHandle>,
    phase: PlaylistPhase,
    on_all_complete: Option<Box<dyn FnOnce()>>,
    /// Set while a pump loop is on the stack
    pumping: bool,
    groups_played: usize,
    events: Option<EventBus>,
}

enum Step {
    Run(Group),
    Finish(Option<Box<dyn FnOnce()>>, usize),
    Idle,
}

impl Playlist {
    pub fn new(host: &HostLoop) -> Self {
        Self {
            shared: Rc::new(RefCell::new(PlaylistState {
                id: Uuid::new_v4(),
                queue: VecDeque::new(),
                active: None,
                phase: PlaylistPhase::Empty,
                on_all_complete: None,
                pumping: false,
                groups_played: 0,
                events: None,
            })),
            host: host.clone(),
        }
    }

    /// Pre-seed the queue
    pub fn with_groups(host: &HostLoop, groups: impl IntoIterator<Item = Group>) -> Result<Self> {
        let playlist = Self::new(host);
        playlist.add_groups(groups)?;
        Ok(playlist)
    }

    /// Emit lifecycle events on `bus`, from this handle and every clone
    pub fn with_event_bus(self, bus: EventBus) -> Self {
        self.shared.borrow_mut().events = Some(bus);
        self
    }

    pub fn id(&self) -> Uuid {
        self.shared.borrow().id
    }

    pub fn phase(&self) -> PlaylistPhase {
        self.shared.borrow().phase
    }

    /// Id of the running group, if any
    pub fn active_group(&self) -> Option<Uuid> {
        self.shared.borrow().active.as_ref().map(GroupHandle::id)
    }

    /// Groups waiting behind the active one
    pub fn queued_len(&self) -> usize {
        self.shared.borrow().queue.len()
    }

    /// Groups whose completion has been consumed, across all drains
    pub fn groups_played(&self) -> usize {
        self.shared.borrow().groups_played
    }

    pub fn add_group(&self, group: Group) -> Result<()> {
        self.add_groups([group]).map(|_| ())
    }

    /// Append groups to the tail, at any time
    ///
    /// Returns the queue length after the append.
    ///
    /// # Errors
    /// `Error::InvalidState` if any group is not Idle; nothing is appended
    /// in that case.
    pub fn add_groups(&self, groups: impl IntoIterator<Item = Group>) -> Result<usize> {
        let groups: Vec<Group> = groups.into_iter().collect();
        if let Some(group) = groups.iter().find(|g| g.phase() != GroupPhase::Idle) {
            return Err(Error::InvalidState(format!(
                "group {} already ran and cannot be queued",
                group.id()
            )));
        }

        let count = groups.len();
        let (playlist_id, queue_len, phase) = {
            let mut state = self.shared.borrow_mut();
            state.queue.extend(groups);
            (state.id, state.queue.len(), state.phase)
        };

        if phase == PlaylistPhase::Drained && count > 0 {
            debug!(
                %playlist_id,
                "Groups appended after completion; call begin to play them"
            );
        }
        debug!(%playlist_id, count, queue_len, "Groups appended");
        Self::emit(&self.shared, CutsceneEvent::GroupsAppended {
            playlist_id,
            count,
            queue_len,
            timestamp: now(),
        });
        Ok(queue_len)
    }

    /// Start draining; `on_all_complete` fires once when the queue empties
    ///
    /// Ignored while already draining (returns `false` and drops the new
    /// callback). From `Empty` or `Drained` a new drain starts; an empty
    /// queue completes before this returns.
    pub fn begin(&self, on_all_complete: impl FnOnce() + 'static) -> bool {
        let (playlist_id, queued_groups) = {
            let mut state = self.shared.borrow_mut();
            if state.phase == PlaylistPhase::Draining {
                warn!(playlist_id = %state.id, "begin called while draining; ignoring");
                return false;
            }
            state.phase = PlaylistPhase::Draining;
            state.on_all_complete = Some(Box::new(on_all_complete));
            (state.id, state.queue.len())
        };

        info!(%playlist_id, queued_groups, "Playlist started");
        Self::emit(&self.shared, CutsceneEvent::PlaylistStarted {
            playlist_id,
            queued_groups,
            timestamp: now(),
        });

        Self::pump(&self.shared, &self.host);
        true
    }

    /// Skip the running group
    ///
    /// Only accelerates the active group's completion; the queue advances
    /// through the normal completion path on the next evaluation. Returns
    /// `false` when nothing is active.
    pub fn skip_current(&self) -> bool {
        let (playlist_id, active) = {
            let state = self.shared.borrow();
            (state.id, state.active.clone())
        };
        let Some(handle) = active else {
            debug!(%playlist_id, "skip_current with no active group");
            return false;
        };

        info!(%playlist_id, group_id = %handle.id(), "Skipping current group");
        handle.skip();
        Self::emit(&self.shared, CutsceneEvent::SkipRequested {
            playlist_id,
            group_id: handle.id(),
            timestamp: now(),
        });
        true
    }

    fn emit(shared: &Rc<RefCell<PlaylistState>>, event: CutsceneEvent) {
        if let Some(bus) = &shared.borrow().events {
            bus.emit_lossy(event);
        }
    }

    /// Run groups until one is pending or the queue is empty
    fn pump(shared: &Rc<RefCell<PlaylistState>>, host: &HostLoop) {
        {
            let mut state = shared.borrow_mut();
            if state.pumping {
                // The loop further up the stack will see the change
                return;
            }
            state.pumping = true;
        }

        loop {
            let step = {
                let mut state = shared.borrow_mut();
                if state.active.is_some() {
                    Step::Idle
                } else if let Some(group) = state.queue.pop_front() {
                    state.active = Some(group.handle());
                    Step::Run(group)
                } else {
                    state.phase = PlaylistPhase::Drained;
                    Step::Finish(state.on_all_complete.take(), state.groups_played)
                }
            };

            match step {
                Step::Idle => break,
                Step::Run(group) => Self::start_group(shared, host, group),
                Step::Finish(callback, groups_played) => {
                    shared.borrow_mut().pumping = false;
                    let playlist_id = shared.borrow().id;
                    info!(%playlist_id, groups_played, "Playlist completed");
                    Self::emit(
                        shared,
                        CutsceneEvent::PlaylistCompleted {
                            playlist_id,
                            groups_played,
                            timestamp: now(),
                        },
                    );
                    if let Some(callback) = callback {
                        callback();
                    }
                    return;
                }
            }
        }

        shared.borrow_mut().pumping = false;
    }

    fn start_group(
        shared: &Rc<RefCell<PlaylistState>>,
        host: &HostLoop,
        mut group: Group,
    ) {
        let playlist_id = shared.borrow().id;
        let group_id = group.id();
        let label = group.label().map(str::to_string);

        info!(
            %playlist_id,
            %group_id,
            label = label.as_deref().unwrap_or(""),
            members = group.len(),
            "Group started"
        );
        Self::emit(
            shared,
            CutsceneEvent::GroupStarted {
                playlist_id,
                group_id,
                label,
                member_count: group.len(),
                designated: group.designated_index(),
                timestamp: now(),
            },
        );

        let weak = Rc::downgrade(shared);
        let completion_host = host.clone();
        let run = group.run(host, move || {
            Self::on_group_complete(&weak, &completion_host, group_id);
        });

        if let Err(e) = run {
            // add_groups only queues Idle groups
            error!(
                %playlist_id,
                %group_id,
                error = %e,
                "Queued group could not run; dropping it"
            );
            shared.borrow_mut().active = None;
        }
    }

    fn on_group_complete(
        weak: &Weak<RefCell<PlaylistState>>,
        host: &HostLoop,
        group_id: Uuid,
    ) {
        let Some(shared) = weak.upgrade() else {
            debug!(%group_id, "Group completed after its playlist was dropped");
            return;
        };

        let (playlist_id, handle) = {
            let mut state = shared.borrow_mut();
            match &state.active {
                Some(active) if active.id() == group_id => {}
                _ => {
                    warn!(
                        playlist_id = %state.id,
                        %group_id,
                        "Ignoring completion from a group that is not active"
                    );
                    return;
                }
            }
            state.groups_played += 1;
            (state.id, state.active.take())
        };

        if let Some(handle) = handle {
            info!(
                %playlist_id,
                %group_id,
                skipped = handle.skip_requested(),
                "Group completed"
            );
            Self::emit(
                &shared,
                CutsceneEvent::GroupCompleted {
                    playlist_id,
                    group_id,
                    label: handle.label().map(str::to_string),
                    skip_requested: handle.skip_requested(),
                    timestamp: now(),
                },
            );
        }

        Self::pump(&shared, host);
    }
}

impl fmt::Debug for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.borrow();
        f.debug_struct("Playlist")
            .field("id", &state.id)
            .field("phase", &state.phase)
            .field("active", &state.active.as_ref().map(GroupHandle::id))
            .field("queued", &state.queue.len())
            .field("groups_played", &state.groups_played)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Wait;
    use crate::TimedAction;
    use std::cell::Cell;
    use std::time::Duration;

    fn group(durations: &[u64]) -> Group {
        Group::from_actions(
            durations
                .iter()
                .map(|&secs| TimedAction::new(Wait::new(Duration::from_secs(secs)))),
        )
        .unwrap()
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        (count, move || inner.set(inner.get() + 1))
    }

    #[test]
    fn test_empty_playlist_completes_immediately() {
        let host = HostLoop::new();
        let playlist = Playlist::new(&host);
        let (fired, on_done) = counter();

        assert_eq!(playlist.phase(), PlaylistPhase::Empty);
        assert!(playlist.begin(on_done));
        assert_eq!(fired.get(), 1);
        assert_eq!(playlist.phase(), PlaylistPhase::Drained);
        assert_eq!(playlist.active_group(), None);
    }

    #[test]
    fn test_empty_groups_drain_without_ticks() {
        let host = HostLoop::new();
        let playlist = Playlist::with_groups(&host, (0..1000).map(|_| Group::new())).unwrap();
        let (fired, on_done) = counter();

        playlist.begin(on_done);
        assert_eq!(fired.get(), 1);
        assert_eq!(playlist.groups_played(), 1000);
        assert_eq!(host.ticks(), 0);
    }

    #[test]
    fn test_begin_is_ignored_while_draining() {
        let host = HostLoop::new();
        let playlist = Playlist::with_groups(&host, [group(&[2])]).unwrap();
        let (first, on_first) = counter();
        let (second, on_second) = counter();

        assert!(playlist.begin(on_first));
        assert!(!playlist.begin(on_second));

        host.run_until_idle(Duration::from_secs(1), 10);
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 0);
    }

    #[test]
    fn test_active_group_tracks_queue_head() {
        let host = HostLoop::new();
        let a = group(&[1]);
        let b = group(&[1]);
        let (a_id, b_id) = (a.id(), b.id());
        let playlist = Playlist::with_groups(&host, [a, b]).unwrap();

        assert_eq!(playlist.active_group(), None);
        playlist.begin(|| {});
        assert_eq!(playlist.active_group(), Some(a_id));
        assert_eq!(playlist.queued_len(), 1);

        host.tick(Duration::from_secs(1));
        assert_eq!(playlist.active_group(), Some(b_id));
        assert_eq!(playlist.queued_len(), 0);

        host.tick(Duration::from_secs(1));
        assert_eq!(playlist.active_group(), None);
        assert_eq!(playlist.phase(), PlaylistPhase::Drained);
    }

    #[test]
    fn test_skip_current_without_active_group() {
        let host = HostLoop::new();
        let playlist = Playlist::with_groups(&host, [group(&[5])]).unwrap();
        assert!(!playlist.skip_current());
    }

    #[test]
    fn test_queueing_a_run_group_is_rejected() {
        let host = HostLoop::new();
        let mut ran = group(&[1]);
        ran.run(&host, || {}).unwrap();

        let playlist = Playlist::with_groups(&host, [group(&[1])]).unwrap();
        let err = playlist.add_groups([group(&[1]), ran]).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(playlist.queued_len(), 1);
    }

    #[test]
    fn test_completion_from_inactive_group_is_ignored() {
        let host = HostLoop::new();
        let first = group(&[5]);
        let first_id = first.id();
        let playlist = Playlist::with_groups(&host, [first, group(&[1])]).unwrap();
        playlist.begin(|| {});

        Playlist::on_group_complete(&Rc::downgrade(&playlist.shared), &host, Uuid::new_v4());

        assert_eq!(playlist.active_group(), Some(first_id));
        assert_eq!(playlist.groups_played(), 0);
        assert_eq!(playlist.queued_len(), 1);
        assert_eq!(playlist.phase(), PlaylistPhase::Draining);

        // The real completions still advance the queue normally
        host.run_until_idle(Duration::from_secs(1), 10);
        assert_eq!(playlist.groups_played(), 2);
        assert_eq!(playlist.phase(), PlaylistPhase::Drained);
    }

    #[test]
    fn test_clone_made_before_bus_shares_it() {
        let host = HostLoop::new();
        let playlist = Playlist::new(&host);
        let early = playlist.clone();
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let _playlist = playlist.with_event_bus(bus);

        early.add_group(group(&[1])).unwrap();
        early.begin(|| {});
        early.skip_current();

        let types: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| event.event_type())
            .collect();
        assert_eq!(
            types,
            vec!["GroupsAppended", "PlaylistStarted", "GroupStarted", "SkipRequested"]
        );
    }

    #[test]
    fn test_dropped_playlist_ignores_late_completion() {
        let host = HostLoop::new();
        let (fired, on_done) = counter();
        {
            let playlist = Playlist::with_groups(&host, [group(&[1])]).unwrap();
            playlist.begin(on_done);
        }
        host.tick(Duration::from_secs(1));
        assert!(host.is_idle());
        assert_eq!(fired.get(), 0);
    }
}
