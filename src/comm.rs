//! Group communication.
//!
//! The I/O and assembly layers only need a handful of blocking collectives.
//! They are consumed through [`Communicator`]; [`SingleComm`] is the trivial
//! one-rank group and [`ThreadComm`] runs a group of ranks as threads of one
//! process.

use crate::{
    error::{domain_error, Error, Result},
    types::{SInt, PEID},
};
use log::debug;
use rayon::ThreadPoolBuilder;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
};

/// A group of ranks.
///
/// Every collective blocks until all ranks of the group have entered it. A
/// rank that never enters a collective deadlocks the group.
pub trait Communicator: Sync {
    fn rank(&self) -> PEID;

    fn size(&self) -> PEID;

    /// Every rank contributes `data`; every rank receives all contributions in
    /// rank order. `op` names the collective so that ranks entering different
    /// operations can be detected.
    fn all_gather_bytes(&self, op: &'static str, data: Vec<u8>) -> Result<Vec<Vec<u8>>>;

    fn barrier(&self) -> Result<()> {
        self.all_gather_bytes("barrier", vec![]).map(|_| ())
    }

    fn all_gather(&self, value: SInt) -> Result<Vec<SInt>> {
        self.all_gather_bytes("all_gather", value.to_ne_bytes().to_vec())?
            .iter()
            .map(|bytes| decode_sint(bytes))
            .collect()
    }

    fn all_reduce_sum(&self, value: SInt) -> Result<SInt> {
        Ok(self.all_gather(value)?.iter().sum())
    }

    /// Sum of the values of all ranks before this one.
    fn exclusive_scan_sum(&self, value: SInt) -> Result<SInt> {
        Ok(self.all_gather(value)?[..self.rank()].iter().sum())
    }

    /// Collects the contributions of all ranks on `root`; other ranks get
    /// `None`.
    fn gather_bytes(&self, root: PEID, data: Vec<u8>) -> Result<Option<Vec<Vec<u8>>>> {
        let all = self.all_gather_bytes("gather", data)?;
        Ok(if self.rank() == root { Some(all) } else { None })
    }
}

fn decode_sint(bytes: &[u8]) -> Result<SInt> {
    let bytes: [u8; 8] = bytes
        .try_into()
        .map_err(|_| Error::CollectiveMismatch(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(SInt::from_ne_bytes(bytes))
}

/// The group consisting of the calling rank only.
pub struct SingleComm;

impl Communicator for SingleComm {
    fn rank(&self) -> PEID {
        0
    }

    fn size(&self) -> PEID {
        1
    }

    fn all_gather_bytes(&self, _op: &'static str, data: Vec<u8>) -> Result<Vec<Vec<u8>>> {
        Ok(vec![data])
    }
}

#[derive(Default)]
struct Round {
    arrived: PEID,
    generation: u64,
    /// The first rank that abandoned the group.
    abandoned_by: Option<PEID>,
}

struct Exchange {
    slots: Mutex<Vec<Option<(&'static str, Vec<u8>)>>>,
    round: Mutex<Round>,
    all_arrived: Condvar,
}

/// One rank of a group whose ranks are threads of the same process.
pub struct ThreadComm {
    rank: PEID,
    size: PEID,
    exchange: Arc<Exchange>,
}

impl ThreadComm {
    /// Creates the `size` communicators of a new group, in rank order.
    pub fn group(size: PEID) -> Vec<ThreadComm> {
        let exchange = Arc::new(Exchange {
            slots: Mutex::new(vec![None; size]),
            round: Mutex::new(Round::default()),
            all_arrived: Condvar::new(),
        });
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                size,
                exchange: exchange.clone(),
            })
            .collect()
    }

    fn poisoned<T>(&self) -> Result<T> {
        Err(Error::CollectiveMismatch(format!(
            "rank {} found the exchange poisoned by a failed rank",
            self.rank
        )))
    }

    /// Blocks until every rank has arrived, or fails once the group is
    /// abandoned.
    fn wait(&self) -> Result<()> {
        let mut round = match self.exchange.round.lock() {
            Ok(round) => round,
            Err(_) => return self.poisoned(),
        };
        if round.abandoned_by.is_some() {
            return self.poisoned();
        }
        let generation = round.generation;
        round.arrived += 1;
        if round.arrived == self.size {
            round.arrived = 0;
            round.generation += 1;
            self.exchange.all_arrived.notify_all();
            return Ok(());
        }
        while round.generation == generation && round.abandoned_by.is_none() {
            round = match self.exchange.all_arrived.wait(round) {
                Ok(round) => round,
                Err(_) => return self.poisoned(),
            };
        }
        if round.generation == generation {
            return self.poisoned();
        }
        Ok(())
    }

    /// Releases every rank blocked in or later entering a collective of this
    /// group; they all fail.
    fn abandon(&self) {
        let mut round = self.round();
        round.abandoned_by.get_or_insert(self.rank);
        self.exchange.all_arrived.notify_all();
    }

    fn abandoned_by(&self) -> Option<PEID> {
        self.round().abandoned_by
    }

    fn round(&self) -> MutexGuard<'_, Round> {
        self.exchange
            .round
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> PEID {
        self.rank
    }

    fn size(&self) -> PEID {
        self.size
    }

    fn all_gather_bytes(&self, op: &'static str, data: Vec<u8>) -> Result<Vec<Vec<u8>>> {
        match self.exchange.slots.lock() {
            Ok(mut slots) => slots[self.rank] = Some((op, data)),
            Err(_) => return self.poisoned(),
        }
        self.wait()?;
        let contributions = match self.exchange.slots.lock() {
            Ok(slots) => slots.clone(),
            Err(_) => return self.poisoned(),
        };
        // Nobody may overwrite a slot before every rank has copied the round.
        self.wait()?;
        let mut result = Vec::with_capacity(self.size);
        for (rank, slot) in contributions.into_iter().enumerate() {
            match slot {
                Some((other, bytes)) if other == op => result.push(bytes),
                Some((other, _)) => {
                    return Err(Error::CollectiveMismatch(format!(
                        "rank {} entered {} while rank {} entered {}",
                        self.rank, op, rank, other
                    )))
                }
                None => {
                    return Err(Error::CollectiveMismatch(format!(
                        "rank {} did not contribute to {}",
                        rank, op
                    )))
                }
            }
        }
        Ok(result)
    }
}

/// Runs `f` once per rank of a new [`ThreadComm`] group of `size` ranks, each
/// on its own thread, and returns the results in rank order.
///
/// A panicking rank abandons the group so that the other ranks fail out of
/// their collectives; the panic is then resumed on the calling thread.
pub fn launch<R, F>(size: PEID, f: F) -> Result<Vec<R>>
where
    R: Send,
    F: Fn(&ThreadComm) -> R + Sync,
{
    if size == 0 {
        return domain_error("a group needs at least one rank");
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(size)
        .thread_name(|i| format!("rank-{}", i))
        .build()
        .map_err(|e| Error::Domain(format!("cannot start {} ranks: {}", size, e)))?;
    let comms = ThreadComm::group(size);
    debug!("launching {} ranks", size);
    let results = pool.broadcast(|ctx| {
        let comm = &comms[ctx.index()];
        panic::catch_unwind(AssertUnwindSafe(|| f(comm))).map_err(|payload| {
            comm.abandon();
            payload
        })
    });
    let mut values = Vec::with_capacity(size);
    let mut panics = vec![];
    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(value) => values.push(value),
            Err(payload) => panics.push((rank, payload)),
        }
    }
    if !panics.is_empty() {
        // Later panics are usually ranks failing on the abandoned group.
        let first = comms[0].abandoned_by();
        let index = panics
            .iter()
            .position(|&(rank, _)| Some(rank) == first)
            .unwrap_or(0);
        panic::resume_unwind(panics.swap_remove(index).1);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_single() {
        let comm = SingleComm;
        assert_eq!(comm.all_gather(5).unwrap(), vec![5]);
        assert_eq!(comm.all_reduce_sum(5).unwrap(), 5);
        assert_eq!(comm.exclusive_scan_sum(5).unwrap(), 0);
        assert_eq!(comm.gather_bytes(0, vec![1]).unwrap(), Some(vec![vec![1]]));
    }

    #[test]
    fn test_thread_collectives() {
        let results = launch(4, |comm| {
            let value = (comm.rank() as SInt + 1) * 10;
            (
                comm.all_gather(value).unwrap(),
                comm.all_reduce_sum(value).unwrap(),
                comm.exclusive_scan_sum(value).unwrap(),
            )
        })
        .unwrap();
        for (rank, (gathered, sum, prefix)) in results.into_iter().enumerate() {
            assert_eq!(gathered, vec![10, 20, 30, 40]);
            assert_eq!(sum, 100);
            assert_eq!(prefix, [0, 10, 30, 60][rank]);
        }
    }

    #[test]
    fn test_gather_on_root() {
        let results = launch(3, |comm| comm.gather_bytes(1, vec![comm.rank() as u8]).unwrap()).unwrap();
        assert_eq!(results[0], None);
        assert_eq!(results[1], Some(vec![vec![0], vec![1], vec![2]]));
        assert_eq!(results[2], None);
    }

    #[test]
    fn test_mismatch() {
        let results = launch(2, |comm| {
            if comm.rank() == 0 {
                comm.barrier()
            } else {
                comm.all_gather(1).map(|_| ())
            }
        })
        .unwrap();
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(Error::CollectiveMismatch(_)))));
    }

    #[test]
    fn test_launch_zero() {
        assert!(launch(0, |comm| comm.rank()).is_err());
    }

    #[test]
    fn test_panicking_rank_releases_the_group() {
        let released = AtomicUsize::new(0);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            launch(3, |comm| {
                if comm.rank() == 0 {
                    panic!("rank 0 failed");
                }
                if comm.barrier().is_err() {
                    released.fetch_add(1, Ordering::SeqCst);
                }
            })
        }));
        let payload = outcome.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"rank 0 failed"));
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }
}
