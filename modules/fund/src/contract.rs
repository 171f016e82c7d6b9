//! Name-based invocation of ledger operations
//!
//! Clients address an operation by name and pass positional string
//! arguments. Results come back as JSON bytes.

use healchain_core::{Amount, CallerId, HealchainError, HealchainResult, TargetType, Timestamp};
use healchain_state::LedgerStore;
use serde::Serialize;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::ledger::FundLedger;
use crate::project::NewRaiseProject;

/// Operation names accepted by [`FundContract::invoke`]
pub const FUNCTIONS: &[&str] = &[
    "Register",
    "Login",
    "GetUserInfo",
    "UpdateUserInfo",
    "GetUsers",
    "Recharge",
    "Donate",
    "CreateRaiseProject",
    "CreateMedicalBill",
    "GetMedicalBill",
    "GetRaiseProjectByPId",
    "GetRaiseProjectByUId",
    "GetRaiseProjects",
    "QueryRaiseProjectsWithPagination",
    "GetTxByUid",
    "GetTxByPId",
    "Examine",
    "GetExamineLogs",
    "GetTxHistory",
    "CreateMilestone",
    "GetMilestone",
    "MintNftCertificate",
    "GetNftsByDonor",
];

/// Dispatch surface over a [`FundLedger`]
pub struct FundContract<S: LedgerStore + ?Sized> {
    ledger: FundLedger<S>,
}

impl<S: LedgerStore + ?Sized> FundContract<S> {
    pub fn new(ledger: FundLedger<S>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &FundLedger<S> {
        &self.ledger
    }

    pub async fn invoke(
        &self,
        caller: &CallerId,
        function: &str,
        args: &[String],
    ) -> HealchainResult<Vec<u8>> {
        debug!(%caller, function, argc = args.len(), "Invoke");
        let result = self.dispatch(caller, function, args).await;
        if let Err(e) = &result {
            warn!(%caller, function, error = %e, "Invocation failed");
        }
        result
    }

    async fn dispatch(
        &self,
        caller: &CallerId,
        function: &str,
        args: &[String],
    ) -> HealchainResult<Vec<u8>> {
        let ledger = &self.ledger;
        match function {
            "Register" => {
                let [id, username, password, email] = arity::<4>(function, args)?;
                to_json(&ledger.register(id, username, password, email).await?)
            }
            "Login" => {
                let [id, password] = arity::<2>(function, args)?;
                to_json(&ledger.login(id, password).await?)
            }
            "GetUserInfo" => {
                let [id] = arity::<1>(function, args)?;
                to_json(&ledger.get_user_info(id).await?)
            }
            "UpdateUserInfo" => {
                let [id, username, email] = arity::<3>(function, args)?;
                to_json(&ledger.update_user_info(id, username, email).await?)
            }
            "GetUsers" => {
                let [] = arity::<0>(function, args)?;
                to_json(&ledger.get_users().await?)
            }
            "Recharge" => {
                let [id, amount] = arity::<2>(function, args)?;
                to_json(&ledger.recharge(id, amount.parse()?).await?)
            }
            "Donate" => {
                let [donor, project, amount] = arity::<3>(function, args)?;
                to_json(&ledger.donate(donor, project, amount.parse()?).await?)
            }
            "CreateRaiseProject" => {
                let (required, bill) = match args {
                    [rest @ .., bill] if args.len() == 5 => (rest, Some(bill.clone())),
                    _ => (args, None),
                };
                let [beneficiary, target, proof, deadline] = arity::<4>(function, required)?;
                let project = NewRaiseProject {
                    beneficiary_id: beneficiary.to_string(),
                    target_amount: target.parse()?,
                    medical_proof: proof.to_string(),
                    deadline: Timestamp::from_secs(parse(deadline, "deadline")?),
                    medical_bill_id: bill.filter(|b| !b.is_empty()),
                };
                to_json(&ledger.create_raise_project(project).await?)
            }
            "CreateMedicalBill" => {
                let [patient, institution, amount, file_path] = arity::<4>(function, args)?;
                let amount: Amount = amount.parse()?;
                to_json(
                    &ledger
                        .create_medical_bill(patient, institution, amount, file_path)
                        .await?,
                )
            }
            "GetMedicalBill" => {
                let [id] = arity::<1>(function, args)?;
                to_json(&ledger.get_medical_bill(id).await?)
            }
            "GetRaiseProjectByPId" => {
                let [id] = arity::<1>(function, args)?;
                to_json(&ledger.get_raise_project_by_pid(id).await?)
            }
            "GetRaiseProjectByUId" => {
                let [id] = arity::<1>(function, args)?;
                to_json(&ledger.get_raise_project_by_uid(id).await?)
            }
            "GetRaiseProjects" => {
                let [] = arity::<0>(function, args)?;
                to_json(&ledger.get_raise_projects().await?)
            }
            "QueryRaiseProjectsWithPagination" => {
                let [page_size, bookmark] = arity::<2>(function, args)?;
                let page_size: usize = parse(page_size, "page size")?;
                to_json(
                    &ledger
                        .query_raise_projects_with_pagination(page_size, bookmark)
                        .await?,
                )
            }
            "GetTxByUid" => {
                let [id] = arity::<1>(function, args)?;
                to_json(&ledger.get_tx_by_uid(id).await?)
            }
            "GetTxByPId" => {
                let [id] = arity::<1>(function, args)?;
                to_json(&ledger.get_tx_by_pid(id).await?)
            }
            "Examine" => {
                let [target_id, target_type, comments, decision] = arity::<4>(function, args)?;
                let target_type: TargetType = target_type.parse()?;
                let decision: bool = parse(decision, "decision")?;
                to_json(
                    &ledger
                        .examine(caller, target_id, target_type, comments, decision)
                        .await?,
                )
            }
            "GetExamineLogs" => {
                let [target_id] = arity::<1>(function, args)?;
                to_json(&ledger.get_examine_logs(target_id).await?)
            }
            "GetTxHistory" => {
                let [key] = arity::<1>(function, args)?;
                to_json(&ledger.get_tx_history(key).await?)
            }
            "CreateMilestone" => {
                let [id, threshold, description] = arity::<3>(function, args)?;
                to_json(&ledger.create_milestone(id, threshold.parse()?, description).await?)
            }
            "GetMilestone" => {
                let [id] = arity::<1>(function, args)?;
                to_json(&ledger.get_milestone(id).await?)
            }
            "MintNftCertificate" => {
                let [id, donor, metadata_url, contract_address] = arity::<4>(function, args)?;
                to_json(
                    &ledger
                        .mint_nft_certificate(id, donor, metadata_url, contract_address)
                        .await?,
                )
            }
            "GetNftsByDonor" => {
                let [donor] = arity::<1>(function, args)?;
                to_json(&ledger.get_nfts_by_donor(donor).await?)
            }
            other => Err(HealchainError::UnknownFunction(other.to_string())),
        }
    }
}

/// Borrow exactly `N` arguments
fn arity<'a, const N: usize>(function: &str, args: &'a [String]) -> HealchainResult<[&'a str; N]> {
    if args.len() != N {
        return Err(HealchainError::InvalidArgument(format!(
            "{} expects {} arguments, got {}",
            function,
            N,
            args.len()
        )));
    }
    Ok(std::array::from_fn(|i| args[i].as_str()))
}

fn parse<T>(value: &str, what: &str) -> HealchainResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| HealchainError::InvalidArgument(format!("invalid {} {:?}: {}", what, value, e)))
}

fn to_json<T: Serialize>(value: &T) -> HealchainResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::test_ledger;
    use crate::record::{ExamineLog, RaiseProject, Transaction, User};
    use healchain_state::MemoryLedgerStore;

    fn contract() -> FundContract<MemoryLedgerStore> {
        FundContract::new(test_ledger())
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    async fn call(
        contract: &FundContract<MemoryLedgerStore>,
        function: &str,
        values: &[&str],
    ) -> HealchainResult<Vec<u8>> {
        contract
            .invoke(&CallerId::new("tester"), function, &args(values))
            .await
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let contract = contract();
        let bytes = call(&contract, "Register", &["u1", "alice", "pw", "a@x"])
            .await
            .unwrap();
        let user: User = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(user.id, "u1");

        let ok = call(&contract, "Login", &["u1", "pw"]).await.unwrap();
        assert_eq!(ok, b"true");
        let bad = call(&contract, "Login", &["u1", "nope"]).await.unwrap();
        assert_eq!(bad, b"false");
    }

    #[tokio::test]
    async fn test_donation_through_dispatch() {
        let contract = contract();
        call(&contract, "Register", &["d1", "dana", "pw", "d@x"])
            .await
            .unwrap();
        let bytes = call(&contract, "CreateRaiseProject", &["b1", "100", "proof", "1900000000"])
            .await
            .unwrap();
        let project: RaiseProject = serde_json::from_slice(&bytes).unwrap();

        let bytes = call(&contract, "Donate", &["d1", project.id.as_str(), "40"])
            .await
            .unwrap();
        let tx: Transaction = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(tx.amount, Amount::new(40));

        let bytes = call(&contract, "GetTxByPId", &[project.id.as_str()]).await.unwrap();
        let txs: Vec<Transaction> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(txs, vec![tx]);
    }

    #[tokio::test]
    async fn test_examine_uses_caller() {
        let contract = contract();
        let bytes = contract
            .invoke(
                &CallerId::new("auditor-7"),
                "Examine",
                &args(&["p1", "raise_project", "ok", "true"]),
            )
            .await
            .unwrap();
        let log: ExamineLog = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(log.auditor_id, "auditor-7");
        assert!(log.decision);
    }

    #[tokio::test]
    async fn test_empty_queries_return_empty_arrays() {
        let contract = contract();
        for function in ["GetUsers", "GetRaiseProjects"] {
            assert_eq!(call(&contract, function, &[]).await.unwrap(), b"[]");
        }
        assert_eq!(call(&contract, "GetTxByUid", &["x"]).await.unwrap(), b"[]");
        assert_eq!(call(&contract, "GetTxHistory", &["x"]).await.unwrap(), b"[]");
    }

    #[tokio::test]
    async fn test_invalid_invocations() {
        let contract = contract();

        assert!(matches!(
            call(&contract, "Transfer", &[]).await,
            Err(HealchainError::UnknownFunction(_))
        ));
        assert!(matches!(
            call(&contract, "GetUserInfo", &[]).await,
            Err(HealchainError::InvalidArgument(_))
        ));
        assert!(matches!(
            call(&contract, "Recharge", &["u1", "ten"]).await,
            Err(HealchainError::InvalidArgument(_))
        ));
        assert!(matches!(
            call(&contract, "Examine", &["p1", "hospital", "", "true"]).await,
            Err(HealchainError::InvalidArgument(_))
        ));
        assert!(matches!(
            call(&contract, "Examine", &["p1", "institution", "", "maybe"]).await,
            Err(HealchainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_function_names_unique() {
        let mut names = FUNCTIONS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FUNCTIONS.len());
    }

    #[tokio::test]
    async fn test_every_listed_function_dispatches() {
        let contract = contract();
        for name in FUNCTIONS {
            let result = call(&contract, name, &[]).await;
            assert!(
                !matches!(result, Err(HealchainError::UnknownFunction(_))),
                "{name} has no dispatch arm"
            );
        }
        assert!(matches!(
            call(&contract, "Mint", &[]).await,
            Err(HealchainError::UnknownFunction(_))
        ));
    }
}
