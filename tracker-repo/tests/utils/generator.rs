use chrono::{DateTime, Duration, SubsecRound, Utc};
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracker_repo::reversal_repo::NewReversal;
use tracker_repo::transaction_repo::NewTransaction;
use uuid::Uuid;

pub trait Generator<T> {
    fn gen(&mut self) -> T;
}

pub struct Predefined<T> {
    values: Vec<T>,
    current_pos: usize,
}

impl<T> Predefined<T> {
    pub fn boxed(values: Vec<T>) -> Box<Predefined<T>> {
        Box::new(Predefined {
            values,
            current_pos: 0,
        })
    }
}

impl<T: Clone> Generator<T> for Predefined<T> {
    fn gen(&mut self) -> T {
        let v = self.values[self.current_pos].clone();
        self.current_pos += 1;
        v
    }
}

pub struct RandomSample<T> {
    values: Vec<T>,
}

impl<T> RandomSample<T> {
    pub fn boxed(values: Vec<T>) -> Box<RandomSample<T>> {
        Box::new(RandomSample { values })
    }
}

impl<T: Clone> Generator<T> for RandomSample<T> {
    fn gen(&mut self) -> T {
        self.values.choose(&mut rand::thread_rng()).unwrap().clone()
    }
}

pub struct FakeGenerator<F: Fake> {
    fake: F,
}

impl<F: Fake> FakeGenerator<F> {
    pub fn boxed(fake: F) -> Box<FakeGenerator<F>> {
        Box::new(FakeGenerator { fake })
    }
}

impl<T: fake::Dummy<F>, F> Generator<T> for FakeGenerator<F> {
    fn gen(&mut self) -> T {
        self.fake.fake()
    }
}

/// Non-negative amounts with two fraction digits.
struct FakeAmount;

impl Generator<Decimal> for FakeAmount {
    fn gen(&mut self) -> Decimal {
        Decimal::new((0..10_000_000i64).fake::<i64>(), 2)
    }
}

/// Dates between one day and one year before now.
struct FakePastDate;

impl Generator<DateTime<Utc>> for FakePastDate {
    fn gen(&mut self) -> DateTime<Utc> {
        let seconds_ago = (86_400..31_536_000i64).fake::<i64>();
        (Utc::now() - Duration::seconds(seconds_ago)).trunc_subsecs(6)
    }
}

#[allow(dead_code)]
pub struct NewTransactionGenerator {
    amnt_gen: Box<dyn Generator<Decimal>>,
    desc_gen: Box<dyn Generator<String>>,
    date_gen: Box<dyn Generator<DateTime<Utc>>>,
    tag_gen: Box<dyn Generator<HashSet<Uuid>>>,
}

#[allow(dead_code)]
impl NewTransactionGenerator {
    pub fn with_amounts(mut self, amounts: Vec<Decimal>) -> NewTransactionGenerator {
        self.amnt_gen = Predefined::boxed(amounts);
        self
    }

    pub fn with_descriptions(mut self, descriptions: Vec<&str>) -> NewTransactionGenerator {
        let descriptions = descriptions.into_iter().map(|d| d.to_string()).collect();
        self.desc_gen = Predefined::boxed(descriptions);
        self
    }

    pub fn with_dates(mut self, dates: Vec<DateTime<Utc>>) -> NewTransactionGenerator {
        self.date_gen = Predefined::boxed(dates);
        self
    }

    /// Picks each transaction's tag set from `tag_sets` at random.
    pub fn with_random_tags(mut self, tag_sets: Vec<HashSet<Uuid>>) -> NewTransactionGenerator {
        self.tag_gen = RandomSample::boxed(tag_sets);
        self
    }

    pub fn generate(&mut self) -> NewTransaction {
        NewTransaction::new(
            self.amnt_gen.gen(),
            self.desc_gen.gen(),
            self.date_gen.gen(),
            self.tag_gen.gen(),
        )
    }

    pub fn generate_many(&mut self, count: usize) -> Vec<NewTransaction> {
        let mut vec = Vec::with_capacity(count);
        for _ in 0..count {
            vec.push(self.generate())
        }
        vec
    }

    /// A reversal of `transaction_id` with a generated amount, description and date.
    pub fn generate_reversal(&mut self, transaction_id: Uuid) -> NewReversal {
        NewReversal::new(
            transaction_id,
            self.amnt_gen.gen(),
            self.desc_gen.gen(),
            self.date_gen.gen(),
        )
    }
}

impl Default for NewTransactionGenerator {
    fn default() -> Self {
        NewTransactionGenerator {
            amnt_gen: Box::new(FakeAmount),
            desc_gen: FakeGenerator::boxed(Sentence(3..6)),
            date_gen: Box::new(FakePastDate),
            tag_gen: RandomSample::boxed(vec![HashSet::new()]),
        }
    }
}
