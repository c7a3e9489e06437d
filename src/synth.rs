//! Synthesis loop.
//!
//! The loop starts with a DAG of one node and grows it one node at a time
//! until the solver finds a formula whose score reaches the goal. The last
//! node of the DAG is always the root of the formula.
//!
//! In incremental mode, the encodings of the nodes are asserted once in the
//! base scope of the solver and only the constraints on the root live in a
//! scope popped after each check. Otherwise everything is asserted in a
//! fresh scope at each iteration, which allows scoring the classification.

use std::time::{Duration, Instant};

use crate::{
    common::*,
    dag::Dag,
    expr::Expr,
    formula::Formula,
    grammar::Grammar,
    logic::Logic,
    score::Classification,
    trace::{sample_metrics, Trace},
    tracer::Tracer,
};

/// Result of a synthesis iteration.
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// True if the formula reaches the score goal.
    pub satisfiable: bool,
    /// Formula found, if any.
    pub formula: Option<Formula>,
    /// Model the formula was decoded from.
    pub model: Model,
    /// Size of the DAG.
    pub size: usize,
    /// Score of the formula.
    pub score: f64,
    /// Goal the score was compared to.
    pub goal: f64,
    /// Classification of the traces by the formula.
    pub classif: Classification,
    /// Time since the beginning of the synthesis.
    pub time: Duration,
    /// Time spent in the solver.
    pub solver_time: Duration,
}

impl SolverResult {
    /// Result of an iteration without formula.
    fn unsat(size: usize, goal: f64) -> Self {
        SolverResult {
            satisfiable: false,
            formula: None,
            model: Model::new(),
            size,
            score: ::std::f64::NEG_INFINITY,
            goal,
            classif: Classification::new(),
            time: Duration::from_secs(0),
            solver_time: Duration::from_secs(0),
        }
    }
}

/// Synthesizes formulas for a logic.
pub struct Synth<L: Logic> {
    /// Logic of the formulas.
    logic: L,
    /// Constants of the logic.
    base: Encoding,
    /// DAG of node choices.
    dag: Dag,
    /// Positive sample.
    pos: Tracer<L>,
    /// Negative sample.
    neg: Tracer<L>,
    /// Grammar, if any.
    grammar: Option<Grammar>,
    /// Solving engine.
    engine: Engine,
    /// Configuration.
    conf: SynthConf,
    /// Start of the synthesis.
    start: Instant,
    /// Profiler.
    profiler: Profiler,
}

impl<L: Logic> Synth<L> {
    /// Constructor.
    ///
    /// Checks the traces and encodes the first node of the DAG.
    pub fn new(
        logic: L,
        pos: Vec<Trace<L::Field>>,
        neg: Vec<Trace<L::Field>>,
        grammar: Option<Grammar>,
        conf: &SynthConf,
        engine: Engine,
    ) -> Res<Self> {
        {
            let traces: Vec<_> = pos.iter().chain(neg.iter()).collect();
            logic.check_traces(&traces)?;
        }
        if pos.is_empty() && neg.is_empty() {
            bail!("cannot learn anything from empty samples")
        }
        let (max_size, max_period) = sample_metrics(pos.iter().chain(neg.iter()));
        log! { @info
            "{} synthesis from {} positive and {} negative trace(s)",
            logic.name(), pos.len(), neg.len() ;
            "  max size {}, max period {}", max_size, max_period
        }

        let mut base = Encoding::new();
        for (name, sort) in logic.decls() {
            base.declare(name, sort)
        }

        if conf.ignores_scoring() {
            warn! {
                "incremental mode does not support scoring" ;
                "the optimized run and the score goal will be ignored"
            }
        }

        let dag = Dag::new(logic.atom_count(), max_size, max_period);
        let mut synth = Synth {
            logic,
            base,
            dag,
            pos: Tracer::new("pos", true, pos),
            neg: Tracer::new("neg", false, neg),
            grammar,
            engine,
            conf: conf.clone(),
            start: Instant::now(),
            profiler: Profiler::new(),
        };
        if synth.conf.incremental {
            synth.engine.encode(&synth.base)?
        }
        synth.grow()?;
        Ok(synth)
    }

    /// Current size of the DAG.
    pub fn size(&self) -> usize {
        self.dag.len()
    }
    /// Logic.
    pub fn logic(&self) -> &L {
        &self.logic
    }
    /// DAG.
    pub fn dag(&self) -> &Dag {
        &self.dag
    }
    /// Positive sample.
    pub fn pos(&self) -> &Tracer<L> {
        &self.pos
    }
    /// Negative sample.
    pub fn neg(&self) -> &Tracer<L> {
        &self.neg
    }

    /// Root of the formula, last node of the DAG.
    fn root(&self) -> NodeIdx {
        NodeIdx::new(self.dag.len() - 1)
    }

    /// Adds a node to the DAG and encodes its semantics on the samples.
    pub fn grow(&mut self) -> Res<NodeIdx> {
        profile! { self tick "encoding" }
        let node = self.dag.grow();
        let _ = self.pos.grow(&self.logic, &self.dag)?;
        let _ = self.neg.grow(&self.logic, &self.dag)?;
        if let Some(grammar) = self.grammar.as_mut() {
            let _ = grammar.grow(&self.dag)?;
        }
        if self.conf.incremental {
            self.engine.encode(self.dag.encoding(node))?;
            self.engine.encode(self.pos.encoding(node))?;
            self.engine.encode(self.neg.encoding(node))?;
            if let Some(grammar) = self.grammar.as_ref() {
                self.engine.encode(grammar.encoding(node))?
            }
        }
        profile! { self mark "encoding" }
        log! { @verb "grew DAG to {} node(s)", self.dag.len() }
        Ok(node)
    }

    /// Asserts the encodings of all the nodes.
    fn encode_all(&mut self) -> Res<()> {
        let grammar = self.grammar.as_ref().map(|grammar| grammar.encodings());
        let encodings = Some(&self.base)
            .into_iter()
            .chain(self.dag.encodings())
            .chain(self.pos.encodings())
            .chain(self.neg.encodings())
            .chain(grammar.into_iter().flatten());
        for encoding in encodings {
            self.engine.encode(encoding)?
        }
        Ok(())
    }

    /// True if the iteration maximizes the score instead of requiring a
    /// perfect classification, and the goal to reach.
    fn goal(&self) -> (bool, f64) {
        if self.conf.incremental {
            return (false, 1.0);
        }
        let size = self.dag.len();
        if self.conf.optimized_run.map(|run| size >= run).unwrap_or(false) {
            return (true, ::std::f64::NEG_INFINITY);
        }
        let traces = self.pos.len() + self.neg.len();
        let goal = self.conf.goal.goal(traces, size);
        if !self.conf.goal.is_reachable(traces, size) {
            warn!(
                "score goal {} at size {} is above 1 and cannot be reached",
                goal, size
            )
        }
        (goal < 1.0, goal)
    }

    /// Conditions for each trace to be classified correctly, with weights.
    fn root_conditions(&self, tracer: &Tracer<L>) -> Vec<(Expr, usize)> {
        tracer
            .root_constraints(self.root())
            .into_iter()
            .zip(tracer.traces().iter().map(|trace| trace.weight))
            .collect()
    }

    /// Solves for the current DAG.
    pub fn solve_iteration(&mut self) -> Res<SolverResult> {
        let root = self.root();
        let size = self.dag.len();
        let (optimize, goal) = self.goal();
        log! { @info
            "solving for size {}{}", size,
            if optimize { format!(", optimizing {} score", self.conf.score) } else { "".into() }
        }
        profile! { self "iterations" => add 1 }

        profile! { self tick "encoding" }
        self.engine.push()?;
        if !self.conf.incremental {
            self.encode_all()?
        }
        self.engine.add(&self.dag.parent_exists(root))?;
        if let Some(grammar) = self.grammar.as_ref() {
            self.engine.add(&grammar.make_start(root))?
        }
        let pos = self.root_conditions(&self.pos);
        let neg = self.root_conditions(&self.neg);
        if optimize {
            self.conf.score.objective(&mut self.engine, &pos, &neg)?
        } else {
            for (cond, _) in pos.iter().chain(neg.iter()) {
                self.engine.add(cond)?
            }
        }
        profile! { self mark "encoding" }

        profile! { self tick "solving" }
        let check = self.engine.check();
        profile! { self mark "solving" }

        let model = match check {
            Ok(CheckRes::Sat) => {
                let mut names = self.dag.model_names(root);
                names.extend(self.pos.root_names(root));
                names.extend(self.neg.root_names(root));
                names.extend(self.base.decls.iter().map(|(name, _)| name.clone()));
                let model = self.engine.get_model(&names);
                self.engine.pop()?;
                model?
            }
            Ok(CheckRes::Unsat) => {
                self.engine.pop()?;
                log! { @info "no formula of size {}", size }
                return Ok(SolverResult::unsat(size, goal));
            }
            Ok(CheckRes::Unknown) => {
                self.engine.pop()?;
                bail!(ErrorKind::Unknown)
            }
            Err(e) => {
                let _ = self.engine.pop();
                return Err(e);
            }
        };

        profile! { self tick "decoding" }
        let res = self.result_of(root, model, goal);
        profile! { self mark "decoding" }
        res
    }

    /// Decodes a model and scores the formula.
    fn result_of(&self, root: NodeIdx, model: Model, goal: f64) -> Res<SolverResult> {
        let formula = Formula::decode(&self.logic, &self.dag, root, &model)?;

        // The classification read from the model must be the one of the
        // decoded formula.
        let mut classif = Classification::new();
        for tracer in &[&self.pos, &self.neg] {
            let positive = tracer.is_positive();
            let correct = tracer.classify(root, &model)?;
            for ((trc, trace), correct) in tracer.traces().index_iter().zip(correct.iter()) {
                if formula.classifies(&self.logic, trace, &model, positive)? != *correct {
                    bail!(
                        "model and formula `{}` disagree on {} trace {}",
                        formula,
                        tracer.name(),
                        trc
                    )
                }
                classif.add(positive, trc, trace.weight, *correct)
            }
        }
        let score = self.conf.score.compute(&classif);
        // Tolerance for the floating point computation of the goal.
        let satisfiable = score >= goal - 1e-9;

        log! { @info
            "found {} ({} node(s) as a tree)", formula, formula.tree_size() ;
            "{} score {}{} {}", self.conf.score, score,
            if satisfiable { " >=" } else { " <" }, goal
        }

        Ok(SolverResult {
            satisfiable,
            formula: Some(formula),
            model,
            size: *root + 1,
            score,
            goal,
            classif,
            time: Instant::now().duration_since(self.start),
            solver_time: self.profiler.duration("solving"),
        })
    }

    /// Grows the DAG until a formula reaches the goal.
    ///
    /// Fails with [`ErrorKind::SizeLimit`][limit] if the size cap of the
    /// configuration is reached.
    ///
    /// [limit]: ../errors/enum.ErrorKind.html#variant.SizeLimit
    /// (SizeLimit variant of ErrorKind)
    pub fn find(&mut self) -> Res<SolverResult> {
        loop {
            let res = self.solve_iteration()?;
            if res.satisfiable {
                return Ok(res);
            }
            if let Some(max) = self.conf.max_size {
                if self.dag.len() >= max {
                    bail!(ErrorKind::SizeLimit(max))
                }
            }
            self.grow()?;
        }
    }

    /// Kills the solver and yields the profiler.
    pub fn destroy(self) -> Res<Profiler> {
        self.engine.kill()?;
        Ok(self.profiler)
    }
}
