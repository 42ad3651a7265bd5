//! Drill-down navigation between aggregation levels.
//!
//! A [`DrillController`] owns the active [`ViewState`] of one chart. Clicking
//! an element drills to the next level, filtered by the element's key; a reset
//! returns to the base level; a context change (for example a location scope
//! picked in another view) replays the current level instead of resetting it.
//!
//! Levels form a graph through [`LevelSpec::next`], so cycles such as
//! month → years of that month → months of one year → years … are allowed.
//! A state becomes active only after the chart rendered it successfully.

use crate::chart::{Interactive, RenderResult, Renderable, Tooltippable};
use crate::data::{ChartData, Key, KeyField, Value};
use crate::error::{Error, Result};
use crate::tooltip::TooltipAccessor;
use std::collections::BTreeMap;
use std::fmt;

/// Index of a level in the controller's level list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LevelId(pub usize);

impl LevelId {
    /// The base level.
    pub const ROOT: Self = Self(0);
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One aggregation level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSpec<O> {
    /// Display name, e.g. `"by_month"`.
    pub name: String,
    /// Field whose value a drill from this level filters on.
    pub key_field: KeyField,
    /// Level a click drills into; `None` makes this level terminal.
    pub next: Option<LevelId>,
    /// Render options used at this level.
    pub options: O,
}

impl<O> LevelSpec<O> {
    /// A terminal level.
    pub fn new(name: impl Into<String>, key_field: impl Into<KeyField>, options: O) -> Self {
        Self {
            name: name.into(),
            key_field: key_field.into(),
            next: None,
            options,
        }
    }

    /// Set the level a click drills into.
    #[must_use]
    pub fn drills_to(mut self, next: LevelId) -> Self {
        self.next = Some(next);
        self
    }
}

/// The element a drill came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Field the key was taken from.
    pub field: KeyField,
    /// Key of the clicked element.
    pub key: Key,
}

/// What a chart currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    /// Active level.
    pub level: LevelId,
    /// Key clicked to reach this level; `None` at the base level.
    pub filter: Option<Filter>,
    /// Orthogonal scope (e.g. `station`), kept across drills and resets.
    pub context: BTreeMap<String, Value>,
}

impl ViewState {
    /// Base level with no filter and no context.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Context value by name.
    #[must_use]
    pub fn context_value(&self, name: &str) -> Option<&Value> {
        self.context.get(name)
    }
}

/// Produces chart data for a view state. Data loading happens elsewhere;
/// implementations filter and aggregate records already in memory.
pub trait DrillSource {
    /// Aggregate the data shown in `state`.
    ///
    /// # Errors
    ///
    /// Implementations report missing fields as [`Error::Schema`].
    fn aggregate(&self, state: &ViewState) -> Result<ChartData>;

    /// Tooltip accessor for `state`, if tooltips are wanted.
    fn tooltip(&self, _state: &ViewState) -> Option<TooltipAccessor> {
        None
    }
}

/// Drill-down state machine for one chart.
pub struct DrillController<O> {
    levels: Vec<LevelSpec<O>>,
    source: Box<dyn DrillSource>,
    state: ViewState,
    transitions: usize,
}

impl<O: fmt::Debug> fmt::Debug for DrillController<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrillController")
            .field("levels", &self.levels)
            .field("state", &self.state)
            .field("transitions", &self.transitions)
            .finish_non_exhaustive()
    }
}

impl<O> DrillController<O> {
    /// Create a controller at the base level. Nothing is rendered until
    /// [`reset`](Self::reset) or [`navigate`](Self::navigate).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `levels` is empty or a `next` link points
    /// outside the list.
    pub fn new(levels: Vec<LevelSpec<O>>, source: impl DrillSource + 'static) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::config("levels", "a drill controller needs at least one level"));
        }
        for level in &levels {
            if let Some(next) = level.next {
                if next.0 >= levels.len() {
                    return Err(Error::config(
                        "levels",
                        format!("level '{}' drills to unknown level {next}", level.name),
                    ));
                }
            }
        }
        Ok(Self {
            levels,
            source: Box::new(source),
            state: ViewState::root(),
            transitions: 0,
        })
    }

    /// The active view state.
    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Spec of the active level.
    #[must_use]
    pub fn level(&self) -> &LevelSpec<O> {
        // `new` rejects an empty list and `navigate` commits only known levels
        &self.levels[self.state.level.0.min(self.levels.len() - 1)]
    }

    /// Number of committed transitions.
    #[must_use]
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    /// Drill into the element keyed `key` at the active level.
    ///
    /// Returns `Ok(None)` at a terminal level.
    ///
    /// # Errors
    ///
    /// Propagates source and render errors; the active state is unchanged on error.
    pub fn drill<C>(&mut self, key: &Key, chart: &mut C) -> Result<Option<RenderResult>>
    where
        C: Renderable<Options = O> + Interactive + Tooltippable + ?Sized,
    {
        let level = self.level();
        let Some(next) = level.next else {
            log::debug!("drill on {key} ignored: level '{}' is terminal", level.name);
            return Ok(None);
        };
        let state = ViewState {
            level: next,
            filter: Some(Filter {
                field: level.key_field.clone(),
                key: key.clone(),
            }),
            context: self.state.context.clone(),
        };
        self.navigate(state, chart).map(Some)
    }

    /// Return to the base level, keeping the context.
    ///
    /// # Errors
    ///
    /// Propagates source and render errors.
    pub fn reset<C>(&mut self, chart: &mut C) -> Result<RenderResult>
    where
        C: Renderable<Options = O> + Interactive + Tooltippable + ?Sized,
    {
        let state = ViewState {
            context: self.state.context.clone(),
            ..ViewState::root()
        };
        self.navigate(state, chart)
    }

    /// Change one context entry (`None` removes it) and replay the active level.
    ///
    /// # Errors
    ///
    /// Propagates source and render errors.
    pub fn set_context<C>(&mut self, name: &str, value: Option<Value>, chart: &mut C) -> Result<RenderResult>
    where
        C: Renderable<Options = O> + Interactive + Tooltippable + ?Sized,
    {
        let mut state = self.state.clone();
        match value {
            Some(v) => state.context.insert(name.to_string(), v),
            None => state.context.remove(name),
        };
        self.navigate(state, chart)
    }

    /// Render `state` and make it active.
    ///
    /// The source's tooltip accessor for the new state is in place for the
    /// render itself, and emphasis is cleared once the render succeeded. The
    /// chart's registered handlers stay in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown level, or the source, render or
    /// tooltip error. On error the active state, the previous accessor, the
    /// drawn elements and their emphasis are all left as they were.
    pub fn navigate<C>(&mut self, state: ViewState, chart: &mut C) -> Result<RenderResult>
    where
        C: Renderable<Options = O> + Interactive + Tooltippable + ?Sized,
    {
        let Some(level) = self.levels.get(state.level.0) else {
            return Err(Error::config("level", format!("unknown level {}", state.level)));
        };
        let data = self.source.aggregate(&state)?;
        let previous = chart.replace_tooltip(self.source.tooltip(&state));
        let result = match chart.render(&data, &level.options) {
            Ok(result) => result,
            Err(e) => {
                chart.replace_tooltip(previous);
                return Err(e);
            }
        };
        chart.clear_highlight();

        log::info!(
            "drill {} -> {} ('{}'){}",
            self.state.level,
            state.level,
            level.name,
            state.filter.as_ref().map(|f| format!(" on {}", f.key)).unwrap_or_default()
        );
        self.state = state;
        self.transitions += 1;
        Ok(result)
    }
}
