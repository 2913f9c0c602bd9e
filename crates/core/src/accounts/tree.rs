//! Builds the account hierarchy from a flat list.

use std::collections::{HashMap, HashSet};

use tally_shared::types::AccountId;

use super::types::{Account, AccountNode};

/// Deepest level attached below a root; anything further down is dropped.
pub const MAX_TREE_DEPTH: usize = 16;

/// Builds a forest of accounts ordered by code at every level.
///
/// Accounts without a parent, or whose parent is not in `accounts`, become
/// roots. Accounts on a parent cycle that no root reaches are omitted, and
/// every account appears at most once.
#[must_use]
pub fn build_tree(mut accounts: Vec<Account>) -> Vec<AccountNode> {
    accounts.sort_by(|a, b| a.code.cmp(&b.code));

    let known: HashSet<AccountId> = accounts.iter().map(|a| a.id).collect();
    let mut roots = Vec::new();
    let mut children: HashMap<AccountId, Vec<Account>> = HashMap::new();

    for account in accounts {
        match account.parent_id {
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push(account);
            }
            _ => roots.push(account),
        }
    }

    let mut visited = HashSet::new();
    roots
        .into_iter()
        .filter_map(|root| attach(root, &mut children, &mut visited, 0))
        .collect()
}

fn attach(
    account: Account,
    children: &mut HashMap<AccountId, Vec<Account>>,
    visited: &mut HashSet<AccountId>,
    depth: usize,
) -> Option<AccountNode> {
    if !visited.insert(account.id) {
        return None;
    }

    let direct = if depth >= MAX_TREE_DEPTH {
        Vec::new()
    } else {
        children.remove(&account.id).unwrap_or_default()
    };

    let nodes = direct
        .into_iter()
        .filter_map(|child| attach(child, children, visited, depth + 1))
        .collect();

    Some(AccountNode {
        account,
        children: nodes,
    })
}
