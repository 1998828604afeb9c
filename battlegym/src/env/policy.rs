// Copyright 2020 Zachary Stewart
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Decision functions for the side the environment plays itself.
use rand::{seq::SliceRandom, Rng, RngCore};

use crate::env::{ActionMask, Observation};

/// Chooses an action for the opponent given its observation and legal actions.
///
/// `rng` is the episode RNG; policies that draw from it stay reproducible per seed. The
/// environment re-validates the returned index against `mask`.
///
/// Any `FnMut(&Observation, &ActionMask) -> usize` closure is a policy.
pub trait OpponentPolicy {
    fn choose_action(
        &mut self,
        observation: &Observation,
        mask: &ActionMask,
        rng: &mut dyn RngCore,
    ) -> usize;
}

impl<F> OpponentPolicy for F
where
    F: FnMut(&Observation, &ActionMask) -> usize,
{
    fn choose_action(
        &mut self,
        observation: &Observation,
        mask: &ActionMask,
        _rng: &mut dyn RngCore,
    ) -> usize {
        self(observation, mask)
    }
}

/// Uniformly random legal action.
#[derive(Debug, Default, Copy, Clone)]
pub struct RandomPolicy;

impl OpponentPolicy for RandomPolicy {
    fn choose_action(
        &mut self,
        _observation: &Observation,
        mask: &ActionMask,
        rng: &mut dyn RngCore,
    ) -> usize {
        random_legal(mask, rng).unwrap_or(0)
    }
}

/// Draw a uniformly random legal index, or `None` if nothing is legal.
pub fn random_legal<R: Rng + ?Sized>(mask: &ActionMask, rng: &mut R) -> Option<usize> {
    let legal: Vec<usize> = mask.legal_actions().collect();
    legal.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn mask_of(size: usize, legal: &[usize]) -> ActionMask {
        let mut mask = ActionMask::none(size);
        for &index in legal {
            mask.allow(index);
        }
        mask
    }

    #[test]
    fn random_policy_only_picks_legal_actions() {
        let mask = mask_of(100, &[3, 50, 97]);
        let obs = Observation::zeros(6);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut policy = RandomPolicy;
        for _ in 0..50 {
            assert!(mask.is_legal(policy.choose_action(&obs, &mask, &mut rng)));
        }
    }

    #[test]
    fn random_legal_of_empty_mask() {
        let mask = ActionMask::none(10);
        assert_eq!(random_legal(&mask, &mut ChaCha8Rng::seed_from_u64(0)), None);
    }

    #[test]
    fn closures_are_policies() {
        let mut calls = 0;
        {
            let mut policy = |_: &Observation, mask: &ActionMask| {
                calls += 1;
                mask.legal_actions().last().unwrap_or(0)
            };
            let mask = mask_of(100, &[4, 8]);
            let action = policy.choose_action(
                &Observation::zeros(6),
                &mask,
                &mut ChaCha8Rng::seed_from_u64(0),
            );
            assert_eq!(action, 8);
        }
        assert_eq!(calls, 1);
    }
}
