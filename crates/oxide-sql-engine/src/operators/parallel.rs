//! Optional parallel variants of a scan and a hash aggregation.
//!
//! Both never call back into session state: `ParallelScan`'s background
//! thread only drives its owned child operator, and `ParallelAggregate`
//! evaluates every expression on the calling thread before handing plain
//! `Value`s to worker threads (an `Evaluator` embeds subquery caches that
//! cannot cross a `thread::spawn` boundary). Both complete all background
//! work before `close()` returns.

use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;

use oxide_sql_types::{canonical_group_key, ColumnDef, Error, Row, Schema, Value};

use crate::expr::Evaluator;

use super::group_by::{AggState, AggregateKindTag, AggregateSpec};
use super::{Lifecycle, Operator};

/// Reads its child on a background thread, feeding rows to the consumer
/// through a bounded channel.
pub struct ParallelScan {
    input: Option<Box<dyn Operator>>,
    schema: Arc<Schema>,
    channel_capacity: usize,
    receiver: Option<mpsc::Receiver<Result<Row, Error>>>,
    handle: Option<thread::JoinHandle<()>>,
    state: Lifecycle,
}

impl ParallelScan {
    #[must_use]
    pub fn new(input: Box<dyn Operator>, channel_capacity: usize) -> Self {
        let schema = input.schema();
        Self {
            input: Some(input),
            schema,
            channel_capacity: channel_capacity.max(1),
            receiver: None,
            handle: None,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for ParallelScan {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        let mut input = self
            .input
            .take()
            .ok_or_else(|| Error::Internal("ParallelScan has no child to open (already opened once)".into()))?;
        let (tx, rx) = mpsc::sync_channel(self.channel_capacity);
        let handle = thread::spawn(move || {
            if let Err(e) = input.open() {
                let _ = tx.send(Err(e));
                return;
            }
            loop {
                match input.next() {
                    Ok(Some(row)) => {
                        if tx.send(Ok(row)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
            let _ = input.close();
        });
        self.receiver = Some(rx);
        self.handle = Some(handle);
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        match &self.receiver {
            Some(rx) => match rx.recv() {
                Ok(item) => item.map(Some),
                Err(mpsc::RecvError) => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        // Dropping the receiver unblocks a worker stuck sending into a full
        // channel so the join below cannot deadlock.
        self.receiver = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

/// Parallel hash aggregation: partitions the buffered, pre-evaluated
/// input across `worker_count` local aggregators, each producing a
/// worker-local partial group map, then merges the partials with the
/// per-aggregate associative combine (`AggState::merge`) before
/// finalizing — same output contract as `GroupBy`.
pub struct ParallelAggregate {
    input: Box<dyn Operator>,
    group_exprs: Vec<Evaluator>,
    aggregate_args: Vec<Option<Evaluator>>,
    aggregates: Vec<AggregateSpec>,
    worker_count: usize,
    schema: Arc<Schema>,
    output: Vec<Row>,
    cursor: usize,
    state: Lifecycle,
}

impl ParallelAggregate {
    /// `aggregate_args` must be parallel to `aggregates`: the evaluator
    /// producing each aggregate's input value (`None` only for `COUNT(*)`).
    #[must_use]
    pub fn new(
        input: Box<dyn Operator>,
        group_exprs: Vec<Evaluator>,
        aggregate_args: Vec<Option<Evaluator>>,
        aggregates: Vec<AggregateSpec>,
        group_output: Vec<ColumnDef>,
        worker_count: usize,
    ) -> Self {
        let mut columns = group_output;
        columns.extend(aggregates.iter().map(|a| a.output.clone()));
        let schema = Arc::new(Schema::new(columns));
        Self {
            input,
            group_exprs,
            aggregate_args,
            aggregates,
            worker_count: worker_count.max(1),
            schema,
            output: Vec::new(),
            cursor: 0,
            state: Lifecycle::default(),
        }
    }
}

type PreRow = (Vec<Value>, Vec<Option<Value>>);
type PartitionMap = HashMap<String, (Vec<Value>, Vec<AggState>)>;

fn aggregate_chunk(chunk: Vec<PreRow>, kinds: Arc<Vec<AggregateKindTag>>) -> Result<PartitionMap, Error> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: PartitionMap = HashMap::new();
    for (group_values, inputs) in chunk {
        let key = canonical_group_key(&group_values);
        let entry = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            (group_values.clone(), kinds.iter().map(|_| AggState::new()).collect())
        });
        for (kind, (state, value)) in kinds.iter().zip(entry.1.iter_mut().zip(inputs.into_iter())) {
            state.update_value(kind, value)?;
        }
    }
    Ok(groups)
}

impl Operator for ParallelAggregate {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.input.open()?;
        self.output.clear();
        self.cursor = 0;

        let mut pre_rows: Vec<PreRow> = Vec::new();
        while let Some(row) = self.input.next()? {
            let mut group_values = Vec::with_capacity(self.group_exprs.len());
            for e in &self.group_exprs {
                group_values.push(e.eval(&row)?);
            }
            let mut inputs = Vec::with_capacity(self.aggregate_args.len());
            for arg in &self.aggregate_args {
                inputs.push(match arg {
                    Some(e) => Some(e.eval(&row)?),
                    None => None,
                });
            }
            pre_rows.push((group_values, inputs));
        }

        let kinds: Arc<Vec<AggregateKindTag>> = Arc::new(self.aggregates.iter().map(|a| AggregateKindTag::from(&a.kind)).collect());

        if pre_rows.is_empty() && self.group_exprs.is_empty() {
            let states: Vec<AggState> = self.aggregates.iter().map(|_| AggState::new()).collect();
            let values: Vec<Value> = kinds.iter().zip(states.iter()).map(|(tag, s)| s.finalize(tag)).collect();
            self.output.push(Row::new(self.schema.clone(), values, oxide_sql_types::RowId(0)));
            return Ok(());
        }

        let chunk_size = pre_rows.len().div_ceil(self.worker_count).max(1);
        let mut handles = Vec::new();
        let mut remaining = pre_rows;
        while !remaining.is_empty() {
            let take = chunk_size.min(remaining.len());
            let chunk: Vec<PreRow> = remaining.drain(..take).collect();
            let kinds = kinds.clone();
            handles.push(thread::spawn(move || aggregate_chunk(chunk, kinds)));
        }

        let mut merged: PartitionMap = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        for handle in handles {
            let partial = handle
                .join()
                .map_err(|_| Error::Internal("ParallelAggregate worker thread panicked".into()))??;
            for (key, (values, states)) in partial {
                if merged.contains_key(&key) {
                    let (_, existing) = merged.get_mut(&key).expect("just checked contains_key");
                    for ((tag, existing_state), incoming_state) in kinds.iter().zip(existing.iter_mut()).zip(states) {
                        existing_state.merge(tag, incoming_state)?;
                    }
                } else {
                    order.push(key.clone());
                    merged.insert(key, (values, states));
                }
            }
        }

        for key in order {
            let (group_values, states) = merged.remove(&key).expect("key was just inserted");
            let mut values = group_values;
            for (tag, state) in kinds.iter().zip(states.iter()) {
                values.push(state.finalize(tag));
            }
            self.output.push(Row::new(self.schema.clone(), values, oxide_sql_types::RowId(0)));
        }
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        if self.cursor >= self.output.len() {
            return Ok(None);
        }
        let row = self.output[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(row))
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        self.output.clear();
        self.input.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::group_by::AggregateKind;
    use crate::operators::Dual;
    use oxide_sql_types::ColumnType;

    #[test]
    fn parallel_scan_streams_rows_through_background_thread() {
        let mut scan = ParallelScan::new(Box::new(Dual::new()), 4);
        scan.open().unwrap();
        assert!(scan.next().unwrap().is_some());
        assert!(scan.next().unwrap().is_none());
        scan.close().unwrap();
    }

    #[test]
    fn parallel_aggregate_count_star_over_single_row_is_one() {
        let aggregates = vec![AggregateSpec {
            kind: AggregateKind::Count { arg: None, distinct: false },
            output: ColumnDef::new("n", ColumnType::BigInt),
        }];
        let mut agg = ParallelAggregate::new(Box::new(Dual::new()), vec![], vec![None], aggregates, vec![], 4);
        agg.open().unwrap();
        let row = agg.next().unwrap().unwrap();
        assert_eq!(row.values[0], Value::BigInt(1));
        agg.close().unwrap();
    }
}
