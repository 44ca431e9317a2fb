// =============================================================================
// PROFILER.RS — named timing probes with an on-screen overlay
//
// A probe measures the microseconds between `start` and `store_elapsed_us`
// and keeps min / current / average / max. Averages come from an optional
// `RunningAverage` history, sampled every `span` measurements.
// =============================================================================

use std::time::Instant;

use log::info;

use super::running_average::RunningAverage;
use crate::graphics::{MINIMAL_FONT, Pen, Surface, TextAlign};
use crate::types::{Point, Rect};

// ── Clock ─────────────────────────────────────────────────────────────────────

pub trait Clock: Send {
    fn now_us(&self) -> u64;
}

/// Wall clock measured from construction.
#[derive(Debug)]
pub struct InstantClock(Instant);

impl Default for InstantClock {
    fn default() -> Self {
        Self(Instant::now())
    }
}

impl Clock for InstantClock {
    fn now_us(&self) -> u64 {
        self.0.elapsed().as_micros() as u64
    }
}

// ── Probe ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Metrics {
    pub min: u32,
    pub cur: u32,
    pub avg: u32,
    pub max: u32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self { min: u32::MAX, cur: 0, avg: 0, max: 0 }
    }
}

impl Metrics {
    pub fn get(&self, metric: GraphElement) -> u32 {
        match metric {
            GraphElement::Min => self.min,
            GraphElement::Cur => self.cur,
            GraphElement::Avg => self.avg,
            GraphElement::Max => self.max,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProfilerProbe {
    name: String,
    start_us: Option<u64>,
    metrics: Metrics,
    history: Option<RunningAverage<f32>>,
    span: u32,
    span_index: u32,
    graph_time_us: u32,
}

impl ProfilerProbe {
    /// `history_size` of 0 keeps no history; the average is then the last
    /// measurement.
    pub fn new(name: impl Into<String>, history_size: usize, span: u32) -> Self {
        let span = span.max(1);
        Self {
            name: name.into(),
            start_us: None,
            metrics: Metrics::default(),
            history: (history_size > 0).then(|| RunningAverage::new(history_size)),
            span,
            span_index: span - 1,
            graph_time_us: 20_000,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&mut self, now_us: u64) {
        self.start_us = Some(now_us);
    }

    /// Record the time since `start`. With `restart` the next measurement
    /// begins now.
    pub fn store_elapsed_us(&mut self, now_us: u64, restart: bool) -> u32 {
        if let Some(start) = self.start_us {
            let m = &mut self.metrics;
            m.cur = now_us.saturating_sub(start).min(u32::MAX as u64) as u32;
            m.min = m.min.min(m.cur);
            m.max = m.max.max(m.cur);
            match &mut self.history {
                Some(history) => {
                    if self.span_index == 0 {
                        history.add(m.cur as f32);
                        m.avg = history.average() as u32;
                        self.span_index = self.span - 1;
                    } else {
                        self.span_index -= 1;
                    }
                }
                None => m.avg = m.cur,
            }
        }
        if restart {
            self.start_us = Some(now_us);
        }
        self.metrics.cur
    }

    pub fn elapsed_metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn history(&self) -> Option<&RunningAverage<f32>> {
        self.history.as_ref()
    }

    pub fn reset(&mut self) {
        if let Some(h) = &mut self.history {
            h.reset();
        }
        self.metrics = Metrics::default();
        self.start_us = None;
    }

    pub fn set_graph_time_us(&mut self, us: u32) {
        self.graph_time_us = us;
    }

    pub fn set_graph_time_us_to_max(&mut self) {
        self.graph_time_us = self.metrics.max;
    }

    pub fn graph_time_us(&self) -> u32 {
        self.graph_time_us
    }

    pub fn log_metrics(&self) {
        let m = &self.metrics;
        info!("[profiler] {:<16} {},\t{},\t{},\t{}", self.name, m.min, m.cur, m.avg, m.max);
    }
}

// ── Profiler ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProbeId(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GraphElement {
    Min = 0,
    Cur = 1,
    Avg = 2,
    Max = 3,
}

impl GraphElement {
    pub const ALL: [GraphElement; 4] = [GraphElement::Min, GraphElement::Cur, GraphElement::Avg, GraphElement::Max];

    pub fn label(self) -> &'static str {
        match self {
            GraphElement::Min => "Min",
            GraphElement::Cur => "Cur",
            GraphElement::Avg => "Avg",
            GraphElement::Max => "Max",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GraphElementStyle {
    pub display_label: bool,
    pub display_graph: bool,
    pub color: Pen,
}

impl Default for GraphElementStyle {
    fn default() -> Self {
        Self { display_label: false, display_graph: false, color: Pen::rgb(0, 255, 0) }
    }
}

pub struct Profiler {
    clock: Box<dyn Clock>,
    probes: Vec<Option<ProfilerProbe>>,
    page: usize,
    elements: [GraphElementStyle; 4],
    width: i32,
    height: i32,
    rows: i32,
    row_height: i32,
    border: i32,
    header_size: i32,
    /// Graph full-scale in microseconds; 0 uses each probe's own.
    graph_time_us: u32,
    history_size: usize,
    history_span: u32,
    alpha: u8,
    display_history: bool,
    history_color: Pen,
}

impl std::fmt::Debug for Profiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profiler")
            .field("probes", &self.probe_count())
            .field("rows", &self.rows)
            .finish()
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl Profiler {
    /// New probes get `history_size` samples of history, one every `span`
    /// measurements.
    pub fn new(history_size: usize, span: u32) -> Self {
        Self::with_clock(Box::new(InstantClock::default()), history_size, span)
    }

    pub fn with_clock(clock: Box<dyn Clock>, history_size: usize, span: u32) -> Self {
        let mut p = Self {
            clock,
            probes: Vec::new(),
            page: 0,
            elements: [GraphElementStyle::default(); 4],
            width: 0,
            height: 0,
            rows: 1,
            row_height: 10,
            border: 5,
            header_size: 15,
            graph_time_us: 20_000,
            history_size,
            history_span: span,
            alpha: 160,
            display_history: false,
            history_color: Pen::rgb(0, 255, 0),
        };
        p.set_display_size(160, 120);
        p.elements[GraphElement::Cur as usize].display_label = true;
        p
    }

    pub fn now_us(&self) -> u64 {
        self.clock.now_us()
    }

    pub fn add_probe(&mut self, name: impl Into<String>) -> ProbeId {
        let (size, span) = (self.history_size, self.history_span);
        self.add_probe_with_history(name, size, span)
    }

    pub fn add_probe_with_history(&mut self, name: impl Into<String>, history_size: usize, span: u32) -> ProbeId {
        self.probes.push(Some(ProfilerProbe::new(name, history_size, span)));
        ProbeId(self.probes.len() - 1)
    }

    pub fn remove_probe(&mut self, id: ProbeId) -> Option<ProfilerProbe> {
        self.probes.get_mut(id.0).and_then(Option::take)
    }

    pub fn probe(&self, id: ProbeId) -> Option<&ProfilerProbe> {
        self.probes.get(id.0).and_then(Option::as_ref)
    }

    pub fn probe_mut(&mut self, id: ProbeId) -> Option<&mut ProfilerProbe> {
        self.probes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn live(&self) -> impl Iterator<Item = &ProfilerProbe> {
        self.probes.iter().flatten()
    }

    pub fn start(&mut self, id: ProbeId) {
        let now = self.clock.now_us();
        if let Some(p) = self.probe_mut(id) {
            p.start(now);
        }
    }

    pub fn store_elapsed_us(&mut self, id: ProbeId, restart: bool) -> u32 {
        let now = self.clock.now_us();
        self.probe_mut(id).map(|p| p.store_elapsed_us(now, restart)).unwrap_or(0)
    }

    /// Start `id` now and store its elapsed time when the guard drops.
    pub fn scoped(&mut self, id: ProbeId) -> ScopedProfilerProbe<'_> {
        self.start(id);
        ScopedProfilerProbe { profiler: self, id }
    }

    pub fn start_all_probes(&mut self) {
        let now = self.clock.now_us();
        for p in self.probes.iter_mut().flatten() {
            p.start(now);
        }
    }

    pub fn clear_all_probes(&mut self) {
        for p in self.probes.iter_mut().flatten() {
            p.reset();
        }
    }

    pub fn log_probes(&self) {
        for p in self.live() {
            p.log_metrics();
        }
    }

    pub fn probe_count(&self) -> usize {
        self.live().count()
    }

    pub fn get_page_count(&self) -> usize {
        let rows = self.rows.max(1) as usize;
        self.probe_count().div_ceil(rows)
    }

    pub fn set_display_size(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height - 20;
        self.rows = (height / self.row_height).max(1);
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.get_page_count());
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_rows(&mut self, rows: i32) {
        self.rows = rows.max(1);
        self.row_height = self.height / self.rows;
    }

    pub fn set_graph_time(&mut self, us: u32) {
        self.graph_time_us = us;
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }

    pub fn display_history(&mut self, enabled: bool, color: Pen) {
        self.display_history = enabled;
        self.history_color = color;
    }

    pub fn set_graph_element(&mut self, metric: GraphElement, display_label: bool, display_graph: bool, color: Pen) {
        self.elements[metric as usize] = GraphElementStyle { display_label, display_graph, color };
    }

    /// Show or hide both the label and the bar of `metric`.
    pub fn set_graph_element_enabled(&mut self, metric: GraphElement, enabled: bool) {
        let e = &mut self.elements[metric as usize];
        e.display_label = enabled;
        e.display_graph = enabled;
    }

    pub fn graph_element(&self, metric: GraphElement) -> &GraphElementStyle {
        &self.elements[metric as usize]
    }

    /// Draw the page chosen with `set_page`.
    pub fn display_overlay(&self, dest: &mut Surface) {
        self.display_probe_overlay(dest, self.page);
    }

    /// Draw page `page` (1-based; 0 draws nothing) of the probe table.
    pub fn display_probe_overlay(&self, dest: &mut Surface, page: usize) {
        if page == 0 {
            return;
        }
        let saved_pen = dest.pen;
        let white = Pen::rgba(255, 255, 255, self.alpha);
        let faint = Pen::rgba(255, 255, 255, self.alpha / 2);

        let labels = self.elements.iter().filter(|e| e.display_label).count().max(1) as i32;
        let use_width = self.width - self.border * 2;
        let name_width = use_width / 3;
        let metric_width = name_width * 2 / labels;
        let name_x = self.border;

        let max_page = self.get_page_count().max(1);
        let page = page.min(max_page);

        dest.pen = white;
        let header = format!("{} ({}/{})", self.graph_time_us, page, max_page);
        dest.text_at(&header, &MINIMAL_FONT, Point::new(self.border, self.border));
        let mut mx = name_x + name_width;
        for m in GraphElement::ALL {
            if self.elements[m as usize].display_label {
                dest.text_at(m.label(), &MINIMAL_FONT, Point::new(mx, self.border));
                mx += metric_width;
            }
        }

        let bars = self.elements.iter().filter(|e| e.display_graph).count().max(1) as i32;
        let bar_height = self.row_height / bars;
        let rows = self.rows.max(1) as usize;
        let mut y = self.header_size;

        for probe in self.live().skip((page - 1) * rows).take(rows) {
            let metrics = probe.elapsed_metrics();
            let graph_time = if self.graph_time_us != 0 { self.graph_time_us } else { probe.graph_time_us() }.max(1);

            dest.pen = white;
            let row = Rect::new(self.border, y, name_width, self.row_height);
            dest.text(probe.name(), &MINIMAL_FONT, row, true, TextAlign::CENTER_V, true);

            let mut mx = name_x + name_width;
            let mut bar = 0;
            for m in GraphElement::ALL {
                let style = &self.elements[m as usize];
                if style.display_label {
                    dest.pen = white;
                    let cell = Rect::new(mx, y, metric_width, self.row_height);
                    dest.text(&metrics.get(m).to_string(), &MINIMAL_FONT, cell, true, TextAlign::CENTER_V, true);
                    mx += metric_width;
                }
                if style.display_graph {
                    dest.pen = Pen { a: self.alpha / 2, ..style.color };
                    let w = ((use_width as f32) * (metrics.get(m) as f32 / graph_time as f32)) as i32;
                    dest.rectangle(Rect::new(self.border, y + bar * bar_height, w.max(1), bar_height - 1));
                    bar += 1;
                }
            }

            dest.pen = faint;
            dest.line(Point::new(self.border, y), Point::new(use_width + self.border, y));

            if self.display_history {
                if let Some(history) = probe.history() {
                    dest.pen = Pen { a: self.alpha, ..self.history_color };
                    self.draw_history(dest, history, y, use_width, graph_time);
                }
            }

            y += self.row_height;
        }

        dest.pen = faint;
        dest.line(Point::new(self.border, y), Point::new(use_width + self.border, y));
        dest.pen = saved_pen;
    }

    fn draw_history(&self, dest: &mut Surface, history: &RunningAverage<f32>, y: i32, use_width: i32, graph_time: u32) {
        let points = history.count();
        let x_inc = use_width as f32 / history.size() as f32;
        let mut x = (self.border + use_width) as f32 - x_inc * points as f32;
        let base = y + self.row_height;
        let mut last: Option<Point> = None;

        for i in 0..points {
            let sample = if x_inc < 1.0 { (i as f32 / x_inc) as usize } else { i };
            let Some(v) = history.get(sample) else { break };
            let dy = ((self.row_height as f32 * (v / graph_time as f32)) as i32).min(self.row_height);
            let p = Point::new(x as i32, base - dy);
            if let Some(prev) = last {
                dest.line(prev, p);
            }
            last = Some(p);
            x += x_inc.max(1.0);
        }
    }
}

/// Guard that records its probe's elapsed time when dropped.
pub struct ScopedProfilerProbe<'a> {
    profiler: &'a mut Profiler,
    id: ProbeId,
}

impl Drop for ScopedProfilerProbe<'_> {
    fn drop(&mut self) {
        self.profiler.store_elapsed_us(self.id, false);
    }
}
