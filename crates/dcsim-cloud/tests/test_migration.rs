use std::collections::BTreeSet;

use dcsim_cloud::core::allocation_policy::{
    vm_allocation_policy_resolver, SimpleVmAllocationPolicy, VmAllocationPolicy,
};
use dcsim_cloud::core::broker::Broker;
use dcsim_cloud::core::cloudlet::{Cloudlet, CloudletStatus};
use dcsim_cloud::core::config::{ConfigError, DatacenterConfig};
use dcsim_cloud::core::events::CloudEvent;
use dcsim_cloud::core::host::Host;
use dcsim_cloud::core::migration::policy::MigrationVmAllocationPolicy;
use dcsim_cloud::core::migration::threshold::{StaticThreshold, ThresholdDetector};
use dcsim_cloud::core::migration::migration_time;
use dcsim_cloud::core::migration::vm_selection::{
    vm_selection_resolver, MinimumUtilizationSelection, VmSelectionStrategy,
};
use dcsim_cloud::core::pe::make_pes;
use dcsim_cloud::core::power_model::power_model_resolver;
use dcsim_cloud::core::placement_strategies::best_fit::BestFit;
use dcsim_cloud::core::placement_strategies::first_fit::FirstFit;
use dcsim_cloud::core::placement_strategies::worst_fit::WorstFit;
use dcsim_cloud::core::vm::{Vm, VmRef, VmStatus};
use dcsim_cloud::simulation::CloudSimulation;
use dcsim_models::utilization::ConstantUtilizationModel;

fn host(id: u32, pes: u32) -> Host {
    Host::new(id, &format!("h{}", id), make_pes(pes, 1000), 65536, 1_000_000_000, 1_000_000)
}

// VM running one cloudlet on all its Pes with the given utilization.
fn loaded_vm(id: u32, pes: u32, utilization: f64) -> VmRef {
    let vm = Vm::new(id, 0, pes, 1000, 1024, 1000, 1000).into_ref();
    let cloudlet = Cloudlet::new(id, 0, id, 1_000_000, pes)
        .with_utilization_model(Box::new(ConstantUtilizationModel::new(utilization)));
    vm.borrow_mut().scheduler_mut().submit(cloudlet, 0., 0.);
    vm
}

fn migration_policy(over: f64, under: f64) -> MigrationVmAllocationPolicy {
    MigrationVmAllocationPolicy::new(
        Box::new(WorstFit::new()),
        Box::new(StaticThreshold::new(over, under).unwrap()),
        Box::new(MinimumUtilizationSelection::new()),
    )
}

fn place(policy: &mut dyn VmAllocationPolicy, vm: &VmRef, host_id: u32, hosts: &mut [Host]) {
    assert!(policy.allocate_host_for_vm_on(vm, host_id, hosts));
}

#[test]
fn test_migration_time() {
    // 10000 MB over 100 Mbit/s with half of the bandwidth
    assert_eq!(migration_time(10000, 100_000_000, 0.5), 1600.);
    assert_eq!(migration_time(1000, 100_000_000, 0.5), 160.);
    assert_eq!(migration_time(1000, 100_000_000, 1.), 80.);
}

#[test]
fn test_threshold_boundaries() {
    let detector = StaticThreshold::new(0.7, 0.2).unwrap();
    assert_eq!(detector.over_threshold(), 0.7);
    assert!(!detector.is_over_utilized(0.7));
    assert!(detector.is_over_utilized(0.7 + 1e-9));
    assert!(!detector.is_under_utilized(0.2));
    assert!(detector.is_under_utilized(0.19));
    assert!(!detector.is_under_utilized(0.));

    assert!(StaticThreshold::new(1., 0.).is_ok());
    assert!(StaticThreshold::new(0., 0.).is_err());
    assert!(StaticThreshold::new(1.2, 0.1).is_err());
    assert!(StaticThreshold::new(0.5, 0.5).is_err());
    assert!(StaticThreshold::new(0.5, -0.1).is_err());
}

#[test]
// Host utilization exactly at the threshold is not over-utilized.
fn test_host_at_threshold_is_not_over_utilized() {
    let mut hosts = vec![host(0, 10)];
    let mut policy = migration_policy(0.7, 0.2);
    let vm = loaded_vm(0, 7, 1.);
    place(&mut policy, &vm, 0, &mut hosts);

    assert_eq!(hosts[0].cpu_utilization(0.), 0.7);
    assert!(!policy.is_host_over_utilized(&hosts[0], 0.));
    assert!(policy.optimize_allocation(&hosts, 0.).is_empty());
}

#[test]
// Host 0 with 4 Pes runs a VM using 3 of them, which is above the 0.7 threshold.
fn test_over_utilized_host_is_migration_source() {
    let mut hosts = vec![host(0, 4), host(1, 8)];
    let mut policy = migration_policy(0.7, 0.2);
    let vm = loaded_vm(0, 3, 1.);
    place(&mut policy, &vm, 0, &mut hosts);
    assert_eq!(hosts[0].cpu_utilization(0.), 0.75);
    assert!(policy.is_host_over_utilized(&hosts[0], 0.));

    let map = policy.optimize_allocation(&hosts, 0.);
    assert_eq!(map.len(), 1);
    assert_eq!(map.sources(), BTreeSet::from([0]));
    assert_eq!(map.target_of(0), Some(1));
    assert!(map.hosts_to_deactivate.is_empty());

    // planning doesn't touch the real hosts
    assert_eq!(hosts[0].vms().len(), 1);
    assert!(hosts[1].vms().is_empty());
    assert_eq!(vm.borrow().host(), Some(0));
    assert_eq!(policy.host_of(0), Some(0));
}

#[test]
fn test_idle_host_is_not_under_utilized() {
    let mut hosts = vec![host(0, 8), host(1, 8), host(2, 8)];
    let mut policy = migration_policy(0.7, 0.2);
    let small = loaded_vm(1, 1, 1.);
    let medium = loaded_vm(2, 4, 1.);
    place(&mut policy, &small, 1, &mut hosts);
    place(&mut policy, &medium, 2, &mut hosts);

    assert_eq!(policy.find_under_utilized_host(&hosts, &BTreeSet::new(), 0.), Some(1));
    assert_eq!(policy.find_under_utilized_host(&hosts, &BTreeSet::from([1]), 0.), None);

    // the small VM is consolidated onto the loaded host, the idle host is neither source nor target
    let map = policy.optimize_allocation(&hosts, 0.);
    assert_eq!(map.len(), 1);
    assert_eq!(map.target_of(1), Some(2));
    assert_eq!(map.hosts_to_deactivate, vec![1]);
    assert!(!map.sources().contains(&0));
}

#[test]
fn test_under_utilized_host_is_kept_when_not_all_vms_fit() {
    let mut hosts = vec![host(0, 4), host(1, 4)];
    let mut policy = migration_policy(0.9, 0.3);
    let first = loaded_vm(0, 1, 1.);
    let second = loaded_vm(1, 3, 1.);
    let third = loaded_vm(2, 1, 0.1);
    place(&mut policy, &first, 0, &mut hosts);
    place(&mut policy, &second, 1, &mut hosts);
    place(&mut policy, &third, 0, &mut hosts);

    // host 0 is at 0.275, host 1 would exceed the over-utilization threshold
    let map = policy.optimize_allocation(&hosts, 0.);
    assert!(map.is_empty());
    assert!(map.hosts_to_deactivate.is_empty());
}

#[test]
// VM 0 leaves the over-utilized host 0 for host 1, which stays under-utilized afterwards.
fn test_migration_target_is_not_consolidated_in_same_pass() {
    let mut hosts = vec![host(0, 10), host(1, 10), host(2, 10)];
    let mut policy = migration_policy(0.7, 0.3);
    place(&mut policy, &loaded_vm(0, 1, 0.1), 0, &mut hosts);
    place(&mut policy, &loaded_vm(1, 8, 0.95), 0, &mut hosts);
    place(&mut policy, &loaded_vm(2, 1, 0.5), 1, &mut hosts);
    place(&mut policy, &loaded_vm(3, 2, 1.), 2, &mut hosts);
    assert!(policy.is_host_over_utilized(&hosts[0], 0.));

    let map = policy.optimize_allocation(&hosts, 0.);
    assert_eq!(map.len(), 1);
    assert_eq!(map.target_of(0), Some(1));
    assert!(map.hosts_to_deactivate.is_empty());
    let planned: BTreeSet<u32> = map.entries.iter().map(|e| e.vm.borrow().id()).collect();
    assert_eq!(planned.len(), map.len());
}

#[test]
fn test_minimum_utilization_selection() {
    let mut h = host(0, 8);
    let vms = vec![
        loaded_vm(0, 1, 0.5),
        loaded_vm(1, 1, 0.2),
        loaded_vm(2, 1, 0.8),
        loaded_vm(3, 1, 0.2),
    ];
    for vm in vms.iter() {
        assert!(h.create_vm(vm));
    }

    let mut selection = MinimumUtilizationSelection::new();
    let selected = selection.select_vm(&h, 0.).unwrap();
    // the first VM wins on ties
    assert_eq!(selected.borrow().id(), 1);

    vms[1].borrow_mut().set_in_migration(true);
    let selected = selection.select_vm(&h, 0.).unwrap();
    assert_eq!(selected.borrow().id(), 3);

    h.mark_migrating_out(3);
    let selected = selection.select_vm(&h, 0.).unwrap();
    assert_eq!(selected.borrow().id(), 0);

    for vm in vms.iter() {
        vm.borrow_mut().set_in_migration(true);
    }
    assert!(selection.select_vm(&h, 0.).is_none());
}

#[test]
fn test_placement_strategies_order() {
    let mut hosts = vec![host(0, 10), host(1, 10), host(2, 10)];
    let mut preload = SimpleVmAllocationPolicy::new(Box::new(FirstFit::new()));
    place(&mut preload, &loaded_vm(10, 5, 1.), 0, &mut hosts);
    place(&mut preload, &loaded_vm(11, 1, 1.), 1, &mut hosts);
    place(&mut preload, &loaded_vm(12, 3, 1.), 2, &mut hosts);
    let none = BTreeSet::new();
    let small = Vm::new(0, 0, 2, 1000, 1024, 1000, 1000);

    let first_fit = SimpleVmAllocationPolicy::new(Box::new(FirstFit::new()));
    assert_eq!(first_fit.find_host_for_vm(&small, &hosts, &none, 0.), Some(0));
    let best_fit = SimpleVmAllocationPolicy::new(Box::new(BestFit::new()));
    assert_eq!(best_fit.find_host_for_vm(&small, &hosts, &none, 0.), Some(0));
    let worst_fit = SimpleVmAllocationPolicy::new(Box::new(WorstFit::new()));
    assert_eq!(worst_fit.find_host_for_vm(&small, &hosts, &none, 0.), Some(1));
    assert_eq!(worst_fit.find_host_for_vm(&small, &hosts, &BTreeSet::from([1]), 0.), Some(2));
}

#[test]
// Hosts at 0.5, 0.1 and 0.3: the least loaded host is taken while it stays under the cap.
fn test_worst_fit_respects_utilization_cap() {
    let mut hosts = vec![host(0, 10), host(1, 10), host(2, 10)];
    let mut policy = migration_policy(0.7, 0.2);
    place(&mut policy, &loaded_vm(10, 5, 1.), 0, &mut hosts);
    place(&mut policy, &loaded_vm(11, 1, 1.), 1, &mut hosts);
    place(&mut policy, &loaded_vm(12, 3, 1.), 2, &mut hosts);
    let none = BTreeSet::new();

    let vm = loaded_vm(0, 5, 1.);
    assert_eq!(policy.find_host_for_vm(&vm.borrow(), &hosts, &none, 0.), Some(1));
    let vm = loaded_vm(1, 6, 1.);
    assert_eq!(policy.find_host_for_vm(&vm.borrow(), &hosts, &none, 0.), Some(1));
    let vm = loaded_vm(2, 7, 1.);
    assert_eq!(policy.find_host_for_vm(&vm.borrow(), &hosts, &none, 0.), None);
}

#[test]
fn test_no_target_oversubscription() {
    let mut hosts = vec![host(0, 4), host(1, 4), host(2, 5)];
    let mut policy = migration_policy(0.7, 0.2);
    let first = loaded_vm(0, 3, 1.);
    let second = loaded_vm(1, 3, 1.);
    place(&mut policy, &first, 0, &mut hosts);
    place(&mut policy, &second, 1, &mut hosts);

    // the target fits only one of the two VMs
    let map = policy.optimize_allocation(&hosts, 0.);
    assert_eq!(map.len(), 1);
    assert_eq!(map.target_of(0), Some(2));
    assert_eq!(map.target_of(1), None);
    assert!(hosts[2].vms().is_empty());
    assert_eq!(hosts[2].vm_scheduler().num_free_pes(), 5);
}

#[test]
fn test_deallocate_is_idempotent() {
    let mut hosts = vec![host(0, 4)];
    let mut policy = SimpleVmAllocationPolicy::new(Box::new(FirstFit::new()));
    let vm = Vm::new(0, 0, 2, 1000, 1024, 1000, 1000).into_ref();

    policy.deallocate_host_for_vm(&vm, &mut hosts);
    policy.deallocate_host_for_vm(&vm, &mut hosts);
    assert_eq!(hosts[0].ram().available(), 65536);
    assert_eq!(vm.borrow().host(), None);

    assert!(policy.allocate_host_for_vm(&vm, &mut hosts, 0.).is_placed());
    assert_eq!(hosts[0].ram().available(), 65536 - 1024);
    policy.deallocate_host_for_vm(&vm, &mut hosts);
    policy.deallocate_host_for_vm(&vm, &mut hosts);
    assert_eq!(hosts[0].ram().available(), 65536);
    assert_eq!(hosts[0].bw().available(), hosts[0].bw().capacity());
    assert_eq!(hosts[0].storage().available(), hosts[0].storage().capacity());
    assert_eq!(hosts[0].vm_scheduler().num_free_pes(), 4);
    assert_eq!(vm.borrow().host(), None);
    assert_eq!(policy.host_of(0), None);
}

#[test]
fn test_failed_suitability_check_changes_nothing() {
    let mut h = host(0, 4);
    let too_much_ram = Vm::new(0, 0, 2, 1000, 100_000, 1000, 1000).into_ref();
    let too_many_pes = Vm::new(1, 0, 5, 1000, 1024, 1000, 1000).into_ref();

    for vm in [too_much_ram, too_many_pes] {
        assert!(!h.is_suitable_for_vm(&vm.borrow()));
        assert!(!h.create_vm(&vm));
        assert_eq!(h.ram().available(), 65536);
        assert_eq!(h.bw().available(), 1_000_000_000);
        assert_eq!(h.storage().available(), 1_000_000);
        assert_eq!(h.vm_scheduler().available_mips(), 4000);
        assert_eq!(h.vm_scheduler().num_free_pes(), 4);
        assert!(h.vms().is_empty());
    }
}

#[test]
fn test_policy_resolver() {
    assert!(vm_allocation_policy_resolver("FirstFit", 1).is_ok());
    assert!(vm_allocation_policy_resolver("Migration<BestFit>", 1).is_ok());
    let config_str = "Migration<WorstFit>[over=0.9,under=0.1,selection=Random,seed=5]";
    assert!(vm_allocation_policy_resolver(config_str, 1).is_ok());

    assert!(matches!(
        vm_allocation_policy_resolver("NextFit", 1),
        Err(ConfigError::UnknownPolicy(_))
    ));
    assert!(matches!(
        vm_allocation_policy_resolver("Migration<FirstFit>[over=0.3,under=0.5]", 1),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        vm_allocation_policy_resolver("Migration<FirstFit>[over=1.5]", 1),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        vm_allocation_policy_resolver("Migration<FirstFit>[selection=MaximumCorrelation]", 1),
        Err(ConfigError::UnknownVmSelection(_))
    ));
    assert!(matches!(
        vm_selection_resolver("MaximumCorrelation", 1),
        Err(ConfigError::UnknownVmSelection(_))
    ));
}

#[test]
// A VM with 1000 MB of RAM leaves an over-utilized host at the first update and moves in 160 seconds.
fn test_datacenter_migrates_vm_from_over_utilized_host() {
    let config = DatacenterConfig::from_file("test-configs/migration.yaml");
    let mut cloud_sim = CloudSimulation::new(123, config).unwrap();
    let h0 = cloud_sim.add_host("h0", 4, 1000, 65536, 100_000_000, 1_000_000);
    let h1 = cloud_sim.add_host("h1", 8, 1000, 65536, 100_000_000, 1_000_000);
    let broker = cloud_sim.create_broker("broker");
    let owner = broker.borrow().id();

    let vm = Vm::new(0, owner, 3, 1000, 1000, 1000, 1000).into_ref();
    broker.borrow().submit_vms(vec![vm.clone()], false, 0.);
    broker
        .borrow()
        .submit_cloudlets(vec![Cloudlet::new(0, owner, 0, 3_000_000, 3)], false, 0.);

    cloud_sim.step_until_time(11.);
    assert_eq!(vm.borrow().host(), Some(h0));
    assert_eq!(vm.borrow().status(), VmStatus::Migrating);
    assert!(vm.borrow().is_in_migration());
    {
        let datacenter = cloud_sim.datacenter();
        let datacenter = datacenter.borrow();
        let target = datacenter.host(h1).unwrap();
        assert_eq!(target.vms_migrating_in().len(), 1);
        assert_eq!(target.vm_scheduler().num_free_pes(), 5);
    }

    cloud_sim.step_until_time(169.);
    assert_eq!(vm.borrow().host(), Some(h0));

    cloud_sim.step_until_time(171.);
    assert_eq!(vm.borrow().host(), Some(h1));
    assert_eq!(vm.borrow().status(), VmStatus::Allocated);
    assert!(!vm.borrow().is_in_migration());
    let datacenter = cloud_sim.datacenter();
    let datacenter = datacenter.borrow();
    assert_eq!(datacenter.stats().migrations, 1);
    assert_eq!(datacenter.stats().failed_migrations, 0);
    assert!(datacenter.host(h1).unwrap().vms_migrating_in().is_empty());
    assert!(datacenter.host(h0).unwrap().vms().is_empty());
    assert_eq!(datacenter.host(h0).unwrap().vm_scheduler().num_free_pes(), 4);
    assert_eq!(datacenter.policy().host_of(0), Some(h1));
}

#[test]
fn test_broker_requested_migration() {
    let config = DatacenterConfig::from_file("test-configs/config.yaml");
    let mut cloud_sim = CloudSimulation::new(123, config).unwrap();
    let h0 = cloud_sim.add_host("h0", 4, 1000, 65536, 100_000_000, 1_000_000);
    let h1 = cloud_sim.add_host("h1", 4, 1000, 65536, 100_000_000, 1_000_000);
    let h2 = cloud_sim.add_host("h2", 1, 1000, 65536, 100_000_000, 1_000_000);
    let broker = cloud_sim.create_broker("broker");
    let owner = broker.borrow().id();

    let vm = Vm::new(0, owner, 2, 1000, 1000, 1000, 1000).into_ref();
    broker.borrow().submit_vms(vec![vm.clone()], false, 0.);
    // the VM doesn't fit on the single-Pe host
    broker.borrow().migrate_vm(vm.clone(), h2, true, 1.);
    broker.borrow().migrate_vm(vm.clone(), h1, true, 5.);
    cloud_sim.step_until_no_events();

    assert_eq!(vm.borrow().host(), Some(h1));
    assert_eq!(vm.borrow().status(), VmStatus::Allocated);
    let acks: Vec<(f64, bool)> = broker
        .borrow()
        .acks()
        .iter()
        .filter_map(|(time, ack)| match ack {
            CloudEvent::VmMigrateAck { success, .. } => Some((*time, *success)),
            _ => None,
        })
        .collect();
    assert_eq!(acks, vec![(1., false), (165., true)]);

    let datacenter = cloud_sim.datacenter();
    let datacenter = datacenter.borrow();
    // a rejected request is not a failed migration
    assert_eq!(datacenter.stats().migrations, 1);
    assert_eq!(datacenter.stats().failed_migrations, 0);
    assert_eq!(datacenter.host(h0).unwrap().vm_scheduler().num_free_pes(), 4);
}

#[test]
// Host 0 stays over-utilized from the first update, host 1 appears at 15 but the next check is only after 110.
fn test_migration_retry_delay() {
    let config = DatacenterConfig::from_file("test-configs/migration_retry.yaml");
    let mut cloud_sim = CloudSimulation::new(123, config).unwrap();
    let h0 = cloud_sim.add_host("h0", 4, 1000, 65536, 100_000_000, 1_000_000);
    let broker = cloud_sim.create_broker("broker");
    let owner = broker.borrow().id();

    let vm = Vm::new(0, owner, 3, 1000, 1000, 1000, 1000).into_ref();
    broker.borrow().submit_vms(vec![vm.clone()], false, 0.);
    broker
        .borrow()
        .submit_cloudlets(vec![Cloudlet::new(0, owner, 0, 3_000_000, 3)], false, 0.);

    cloud_sim.step_until_time(15.);
    let h1 = cloud_sim.add_host("h1", 8, 1000, 65536, 100_000_000, 1_000_000);

    cloud_sim.step_until_time(115.);
    assert_eq!(vm.borrow().host(), Some(h0));
    assert_eq!(vm.borrow().status(), VmStatus::Allocated);
    assert!(!vm.borrow().is_in_migration());
    assert!(cloud_sim.datacenter().borrow().host(h1).unwrap().vms_migrating_in().is_empty());

    cloud_sim.step_until_time(125.);
    assert_eq!(vm.borrow().status(), VmStatus::Migrating);
    assert_eq!(cloud_sim.datacenter().borrow().host(h1).unwrap().vms_migrating_in().len(), 1);

    cloud_sim.step_until_time(281.);
    assert_eq!(vm.borrow().host(), Some(h1));
    assert_eq!(cloud_sim.datacenter().borrow().stats().migrations, 1);
}

#[test]
// The single-Pe VM leaves the under-utilized host 0, which is switched off until the next VM is placed on it.
fn test_consolidated_host_is_switched_off_and_on() {
    let config = DatacenterConfig::from_file("test-configs/migration.yaml");
    let mut cloud_sim = CloudSimulation::new(123, config).unwrap();
    let power_model = || Some(power_model_resolver("Linear[max=200,static=0.5]").unwrap());
    let h0 = cloud_sim.add_host_with_power_model("h0", 8, 1000, 65536, 100_000_000, 1_000_000, power_model());
    let h1 = cloud_sim.add_host_with_power_model("h1", 8, 1000, 65536, 100_000_000, 1_000_000, power_model());
    let broker = cloud_sim.create_broker("broker");
    let owner = broker.borrow().id();

    let small = Vm::new(0, owner, 1, 1000, 1000, 1000, 1000).into_ref();
    let medium = Vm::new(1, owner, 4, 1000, 1000, 1000, 1000).into_ref();
    broker.borrow().submit_vms(vec![small.clone()], false, 0.);
    broker
        .borrow()
        .submit_cloudlets(vec![Cloudlet::new(0, owner, 0, 10_000_000, 1)], false, 0.);
    broker.borrow().submit_vms(vec![medium.clone()], false, 1.);
    broker
        .borrow()
        .submit_cloudlets(vec![Cloudlet::new(1, owner, 1, 10_000_000, 4)], false, 1.);

    cloud_sim.step_until_time(5.);
    assert_eq!(small.borrow().host(), Some(h0));
    assert_eq!(medium.borrow().host(), Some(h1));

    cloud_sim.step_until_time(11.);
    assert_eq!(small.borrow().status(), VmStatus::Migrating);
    assert!(cloud_sim.datacenter().borrow().host(h0).unwrap().is_active());

    cloud_sim.step_until_time(175.);
    assert_eq!(small.borrow().host(), Some(h1));
    let (energy_off, h1_energy) = {
        let datacenter = cloud_sim.datacenter();
        let datacenter = datacenter.borrow();
        assert!(!datacenter.host(h0).unwrap().is_active());
        assert_eq!(datacenter.stats().migrations, 1);
        (datacenter.host_energy(h0), datacenter.host_energy(h1))
    };
    assert!(energy_off > 0.);

    // switched off host consumes nothing
    cloud_sim.step_until_time(295.);
    {
        let datacenter = cloud_sim.datacenter();
        let datacenter = datacenter.borrow();
        assert_eq!(datacenter.host_energy(h0), energy_off);
        assert!(datacenter.host_energy(h1) > h1_energy);
    }

    let late = Vm::new(2, owner, 2, 1000, 1000, 1000, 1000).into_ref();
    broker.borrow().submit_vms(vec![late.clone()], false, 0.);
    cloud_sim.step_until_time(320.);
    assert_eq!(late.borrow().host(), Some(h0));
    let datacenter = cloud_sim.datacenter();
    let datacenter = datacenter.borrow();
    assert!(datacenter.host(h0).unwrap().is_active());
    assert!(datacenter.host_energy(h0) > energy_off);
}

fn migrate_acks(broker: &Broker) -> Vec<(f64, bool)> {
    broker
        .acks()
        .iter()
        .filter_map(|(time, ack)| match ack {
            CloudEvent::VmMigrateAck { success, .. } => Some((*time, *success)),
            _ => None,
        })
        .collect()
}

#[test]
// Target host fails while the VM memory is transferred, the VM stays on its source.
fn test_vm_returns_to_source_when_target_fails() {
    let config = DatacenterConfig::from_file("test-configs/config.yaml");
    let mut cloud_sim = CloudSimulation::new(123, config).unwrap();
    let h0 = cloud_sim.add_host("h0", 4, 1000, 65536, 100_000_000, 1_000_000);
    let h1 = cloud_sim.add_host("h1", 2, 1000, 65536, 100_000_000, 1_000_000);
    let broker = cloud_sim.create_broker("broker");
    let owner = broker.borrow().id();

    let vm = Vm::new(0, owner, 2, 1000, 1000, 1000, 1000).into_ref();
    broker.borrow().submit_vms(vec![vm.clone()], false, 0.);
    broker
        .borrow()
        .submit_cloudlets(vec![Cloudlet::new(0, owner, 0, 1_000_000, 2)], false, 0.);
    broker.borrow().migrate_vm(vm.clone(), h1, true, 1.);
    cloud_sim.inject_pe_failure(h1, 0, 50.);
    cloud_sim.inject_pe_failure(h1, 1, 50.);

    cloud_sim.step_until_time(100.);
    assert_eq!(vm.borrow().status(), VmStatus::Migrating);
    {
        let datacenter = cloud_sim.datacenter();
        let datacenter = datacenter.borrow();
        assert!(datacenter.host(h1).unwrap().is_failed());
        assert!(datacenter.host(h1).unwrap().vms_migrating_in().is_empty());
    }

    cloud_sim.step_until_no_events();
    assert_eq!(vm.borrow().host(), Some(h0));
    assert_eq!(vm.borrow().status(), VmStatus::Allocated);
    assert!(!vm.borrow().is_in_migration());
    assert_eq!(migrate_acks(&broker.borrow()), vec![(161., false)]);
    assert_eq!(
        broker.borrow().returned_cloudlet(0).unwrap().status(),
        CloudletStatus::Success
    );
    let datacenter = cloud_sim.datacenter();
    let datacenter = datacenter.borrow();
    assert_eq!(datacenter.stats().migrations, 0);
    assert_eq!(datacenter.stats().failed_migrations, 1);
    assert_eq!(datacenter.policy().host_of(0), Some(h0));
}

#[test]
// Both the target and one Pe of the source fail during the transfer, the VM has nowhere to go.
fn test_vm_fails_when_source_cannot_take_it_back() {
    let config = DatacenterConfig::from_file("test-configs/config.yaml");
    let mut cloud_sim = CloudSimulation::new(123, config).unwrap();
    let h0 = cloud_sim.add_host("h0", 2, 1000, 65536, 100_000_000, 1_000_000);
    let h1 = cloud_sim.add_host("h1", 2, 1000, 65536, 100_000_000, 1_000_000);
    let broker = cloud_sim.create_broker("broker");
    let owner = broker.borrow().id();

    let vm = Vm::new(0, owner, 2, 1000, 1000, 1000, 1000).into_ref();
    broker.borrow().submit_vms(vec![vm.clone()], false, 0.);
    broker
        .borrow()
        .submit_cloudlets(vec![Cloudlet::new(0, owner, 0, 1_000_000, 2)], false, 0.);
    broker.borrow().migrate_vm(vm.clone(), h1, true, 1.);
    cloud_sim.inject_pe_failure(h0, 0, 50.);
    cloud_sim.inject_pe_failure(h1, 0, 50.);
    cloud_sim.inject_pe_failure(h1, 1, 50.);
    cloud_sim.step_until_no_events();

    assert_eq!(vm.borrow().status(), VmStatus::Failed);
    assert_eq!(vm.borrow().host(), None);
    assert_eq!(migrate_acks(&broker.borrow()), vec![(161., false)]);
    assert_eq!(
        broker.borrow().returned_cloudlet(0).unwrap().status(),
        CloudletStatus::Failed
    );
    let datacenter = cloud_sim.datacenter();
    let datacenter = datacenter.borrow();
    assert_eq!(datacenter.stats().failed_migrations, 1);
    assert_eq!(datacenter.policy().host_of(0), None);
    assert!(!datacenter.host(h0).unwrap().is_failed());
    assert!(datacenter.host(h0).unwrap().vms().is_empty());
}

#[test]
fn test_zero_bandwidth_target_rejects_migration() {
    let config = DatacenterConfig::from_file("test-configs/config.yaml");
    let mut cloud_sim = CloudSimulation::new(123, config).unwrap();
    let h0 = cloud_sim.add_host("h0", 4, 1000, 65536, 100_000_000, 1_000_000);
    let h1 = cloud_sim.add_host("h1", 4, 1000, 65536, 0, 1_000_000);
    let broker = cloud_sim.create_broker("broker");
    let owner = broker.borrow().id();

    // the VM needs no bandwidth, so only the transfer time stands in the way
    let vm = Vm::new(0, owner, 2, 1000, 1000, 0, 1000).into_ref();
    broker.borrow().submit_vms(vec![vm.clone()], false, 0.);
    broker.borrow().migrate_vm(vm.clone(), h1, true, 1.);
    cloud_sim.step_until_no_events();

    assert_eq!(vm.borrow().host(), Some(h0));
    assert_eq!(vm.borrow().status(), VmStatus::Allocated);
    assert!(!vm.borrow().is_in_migration());
    assert_eq!(migrate_acks(&broker.borrow()), vec![(1., false)]);
    let datacenter = cloud_sim.datacenter();
    let datacenter = datacenter.borrow();
    assert!(datacenter.host(h1).unwrap().vms_migrating_in().is_empty());
    assert_eq!(datacenter.host(h1).unwrap().vm_scheduler().num_free_pes(), 4);
}
